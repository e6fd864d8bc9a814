//! Terminal rendering of slides, the slide outline and the sync badge.
//!
//! Every function returns a `String` so the caller decides where it goes.

use colored::Colorize;

use crate::deck::{Document, Slide, SlideType};
use crate::session::{SyncState, SyncStatus};
use crate::theme::Theme;

const GRID_ITEMS: usize = 4;
const INDENT: &str = "  ";

/// Render one slide inside a frame, with its position in the deck.
pub fn render_slide(slide: &Slide, index: usize, total: usize, theme: &Theme) -> String {
    let mut out = Vec::new();
    out.push(rule(theme, &format!(" {} ", slide.kind.display_name())));
    out.push(String::new());

    match slide.kind {
        SlideType::Title => title(&mut out, slide, theme),
        SlideType::ContentList => content_list(&mut out, slide, theme),
        SlideType::TwoColumn => two_column(&mut out, slide, theme),
        SlideType::GridFour => grid_four(&mut out, slide, theme),
        SlideType::Quote => quote(&mut out, slide, theme),
    }

    out.push(String::new());
    let position = format!("{} / {}", index + 1, total);
    let footer = match slide.footer.as_deref().filter(|f| !f.is_empty()) {
        Some(footer) => format!("{footer}  ·  {position}"),
        None => position,
    };
    let pad = theme.width.saturating_sub(footer.chars().count());
    out.push(format!("{}{}", " ".repeat(pad), footer.color(theme.muted)));
    out.push(rule(theme, ""));
    out.join("\n")
}

fn title(out: &mut Vec<String>, slide: &Slide, theme: &Theme) {
    if let Some(subtitle) = subtitle(slide) {
        out.push(format!("{INDENT}{}", subtitle.to_uppercase().color(theme.accent)));
    }
    out.push(format!(
        "{INDENT}{}",
        slide.title.color(theme.heading_color).bold()
    ));
    let tags: Vec<&str> = items(slide).collect();
    if !tags.is_empty() {
        out.push(String::new());
        out.push(format!(
            "{INDENT}{}",
            tags.join("  ·  ").color(theme.foreground)
        ));
    }
}

fn heading(out: &mut Vec<String>, slide: &Slide, theme: &Theme) {
    out.push(format!(
        "{INDENT}{}",
        slide.title.color(theme.heading_color).bold()
    ));
    if let Some(subtitle) = subtitle(slide) {
        out.push(format!("{INDENT}{}", subtitle.color(theme.muted).italic()));
    }
    out.push(String::new());
}

fn content_list(out: &mut Vec<String>, slide: &Slide, theme: &Theme) {
    heading(out, slide, theme);
    for (i, item) in items(slide).enumerate() {
        out.push(format!(
            "{INDENT}{}  {}",
            format!("{:02}", i + 1).color(theme.accent).bold(),
            item.color(theme.foreground)
        ));
    }
}

fn two_column(out: &mut Vec<String>, slide: &Slide, theme: &Theme) {
    heading(out, slide, theme);
    let column = (theme.width - INDENT.len() * 3) / 2;
    let cells: Vec<&str> = items(slide).collect();
    for row in cells.chunks(2) {
        let left = fit(row[0], column);
        let right = row.get(1).map(|s| fit(s, column)).unwrap_or_default();
        let pad = column.saturating_sub(left.chars().count());
        out.push(format!(
            "{INDENT}{}{}{INDENT}{}",
            left.color(theme.foreground),
            " ".repeat(pad),
            right.color(theme.foreground)
        ));
    }
}

fn grid_four(out: &mut Vec<String>, slide: &Slide, theme: &Theme) {
    heading(out, slide, theme);
    for item in items(slide).take(GRID_ITEMS) {
        let (label, body) = split_label(item);
        out.push(format!(
            "{INDENT}{} {}",
            "▌".color(theme.accent),
            label.color(theme.heading_color).bold()
        ));
        if let Some(body) = body {
            out.push(format!("{INDENT}  {}", body.color(theme.foreground)));
        }
    }
}

fn quote(out: &mut Vec<String>, slide: &Slide, theme: &Theme) {
    out.push(format!("{INDENT}{}", slide.title.color(theme.muted)));
    out.push(String::new());
    for item in items(slide) {
        out.push(format!(
            "{INDENT}{}",
            format!("“{item}”").color(theme.heading_color).bold()
        ));
    }
    if let Some(subtitle) = subtitle(slide) {
        out.push(String::new());
        out.push(format!("{INDENT}— {}", subtitle.color(theme.accent)));
    }
}

fn subtitle(slide: &Slide) -> Option<&str> {
    slide.subtitle.as_deref().filter(|s| !s.trim().is_empty())
}

fn items(slide: &Slide) -> impl Iterator<Item = &str> {
    slide
        .content
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// `"Strength: fast iteration"` splits into a label and a body.
pub fn split_label(item: &str) -> (&str, Option<&str>) {
    match item.split_once(':') {
        Some((label, body)) if !body.trim().is_empty() => (label.trim(), Some(body.trim())),
        _ => (item.trim(), None),
    }
}

fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn rule(theme: &Theme, label: &str) -> String {
    let fill = theme.width.saturating_sub(label.chars().count() + 2);
    format!("──{label}{}", "─".repeat(fill))
        .color(theme.muted)
        .to_string()
}

/// One line per slide, the selected one marked.
pub fn render_outline(document: &Document, selected: usize, theme: &Theme) -> String {
    document
        .slides()
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            let marker = if i == selected { "▸" } else { " " };
            let line = format!(
                "{marker} {:>2}. {:<12} {}",
                i + 1,
                slide.kind.display_name(),
                slide.title
            );
            if i == selected {
                line.color(theme.accent).bold().to_string()
            } else {
                line.color(theme.foreground).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(status: &SyncStatus) -> String {
    let message = if status.message.is_empty() {
        "Local only"
    } else {
        status.message.as_str()
    };
    match status.state {
        SyncState::Idle => format!("○ {message}").dimmed().to_string(),
        SyncState::Loading => format!("◌ {message}").yellow().to_string(),
        SyncState::Success | SyncState::Synced => format!("● {message}").green().to_string(),
        SyncState::Error => format!("✕ {message}").red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::default_deck;

    fn plain() -> Theme {
        colored::control::set_override(false);
        Theme::light()
    }

    #[test]
    fn test_grid_shows_first_four_items() {
        let theme = plain();
        let mut slide = Slide::placeholder("1".into(), SlideType::GridFour);
        slide.content = (1..=6).map(|i| format!("L{i}: body {i}")).collect();

        let out = render_slide(&slide, 0, 1, &theme);
        assert!(out.contains("L4"));
        assert!(out.contains("body 4"));
        assert!(!out.contains("L5"));
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("Vision: growth"), ("Vision", Some("growth")));
        assert_eq!(split_label("No label"), ("No label", None));
        assert_eq!(split_label("Trailing:"), ("Trailing:", None));
    }

    #[test]
    fn test_footer_and_position() {
        let theme = plain();
        let deck = default_deck();
        let mut slide = deck.slides()[1].clone();
        slide.footer = Some("LimeFlow".into());
        let out = render_slide(&slide, 1, deck.len(), &theme);
        assert!(out.contains("LimeFlow  ·  2 / 4"));
    }

    #[test]
    fn test_quote_attribution() {
        let theme = plain();
        let mut slide = Slide::placeholder("1".into(), SlideType::Quote);
        slide.content = vec!["Ship it".into()];
        slide.subtitle = Some("Team".into());
        let out = render_slide(&slide, 0, 1, &theme);
        assert!(out.contains("“Ship it”"));
        assert!(out.contains("— Team"));
    }

    #[test]
    fn test_two_column_truncates_long_cells() {
        let theme = plain();
        let mut slide = Slide::placeholder("1".into(), SlideType::TwoColumn);
        slide.content = vec!["x".repeat(200), "right".into(), "odd".into()];
        let out = render_slide(&slide, 0, 1, &theme);
        assert!(out.contains('…'));
        assert!(out.contains("right"));
        assert!(out.contains("odd"));
    }

    #[test]
    fn test_outline_marks_selection() {
        let theme = plain();
        let out = render_outline(&default_deck(), 2, &theme);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with('▸'));
        assert!(lines[0].starts_with(' '));
    }

    #[test]
    fn test_status_badge() {
        colored::control::set_override(false);
        assert_eq!(render_status(&SyncStatus::idle()), "○ Local only");
        assert_eq!(
            render_status(&SyncStatus::error("Save failed")),
            "✕ Save failed"
        );
    }
}
