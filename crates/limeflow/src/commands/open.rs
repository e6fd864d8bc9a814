use anyhow::Result;
use colored::Colorize;
use inquire::{Confirm, InquireError, Select, Text};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::ai::{self, AiError, ContentGenerator, GeminiGenerator};
use crate::cache::FileCache;
use crate::config::Config;
use crate::deck::{Slide, SlideEdit, SlideType};
use crate::link::LaunchParams;
use crate::render;
use crate::session::ticker::{self, DEFAULT_TICK};
use crate::session::{
    Direction, Mode, Session, SessionError, SharedSession, SyncState, Ticker, Worker,
};
use crate::store::HttpStore;
use crate::theme::Theme;

/// Extra time allowed past the store timeout when waiting on the worker.
const SETTLE_MARGIN: Duration = Duration::from_secs(2);

type Live = Session<Worker, FileCache>;

pub struct OpenArgs {
    pub link: Option<String>,
    pub present: bool,
    pub sheet: Option<String>,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WelcomeAction {
    Connect,
    Offline,
    Setup,
    Quit,
}

impl fmt::Display for WelcomeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "Connect a Google Sheet store",
            Self::Offline => "Try it offline",
            Self::Setup => "How do I set up a store?",
            Self::Quit => "Quit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorAction {
    Next,
    Previous,
    Jump,
    Title,
    Subtitle,
    Footer,
    Content,
    Layout,
    Add,
    Delete,
    MoveUp,
    MoveDown,
    Undo,
    Redo,
    AiFill,
    AiRedesign,
    Present,
    Connect,
    Share,
    Logout,
    Quit,
}

impl EditorAction {
    const ALL: [EditorAction; 21] = [
        Self::Next,
        Self::Previous,
        Self::Jump,
        Self::Title,
        Self::Subtitle,
        Self::Footer,
        Self::Content,
        Self::Layout,
        Self::Add,
        Self::Delete,
        Self::MoveUp,
        Self::MoveDown,
        Self::Undo,
        Self::Redo,
        Self::AiFill,
        Self::AiRedesign,
        Self::Present,
        Self::Connect,
        Self::Share,
        Self::Logout,
        Self::Quit,
    ];
}

impl fmt::Display for EditorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Next => "Next slide",
            Self::Previous => "Previous slide",
            Self::Jump => "Go to slide...",
            Self::Title => "Edit title",
            Self::Subtitle => "Edit subtitle",
            Self::Footer => "Edit footer",
            Self::Content => "Edit content",
            Self::Layout => "Change layout",
            Self::Add => "Add slide after this one",
            Self::Delete => "Delete this slide",
            Self::MoveUp => "Move slide up",
            Self::MoveDown => "Move slide down",
            Self::Undo => "Undo",
            Self::Redo => "Redo",
            Self::AiFill => "AI: write the content",
            Self::AiRedesign => "AI: redesign this slide",
            Self::Present => "Present",
            Self::Connect => "Connect a store",
            Self::Share => "Share links",
            Self::Logout => "Log out",
            Self::Quit => "Quit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresentAction {
    Next,
    Previous,
    Jump,
    Exit,
}

impl fmt::Display for PresentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Next => "Next",
            Self::Previous => "Previous",
            Self::Jump => "Go to slide...",
            Self::Exit => "Exit presentation",
        })
    }
}

struct Ui {
    config: Config,
    theme: Theme,
    quiet: bool,
    session: SharedSession<Worker, FileCache>,
}

/// Run the interactive editor / presenter.
pub fn run(args: OpenArgs) -> Result<()> {
    let config = Config::load_or_default();
    let mut params = match &args.link {
        Some(link) => super::parse_link(link)?,
        None => LaunchParams::default(),
    };
    params.present |= args.present;
    if let Some(sheet) = args.sheet {
        params.data = None;
        params.sheet = Some(sheet);
    }

    let wait = config.store_timeout() + SETTLE_MARGIN;
    let worker = Worker::spawn(HttpStore::new(config.store_timeout()));
    let mut session: Live = Session::bootstrap(
        &params,
        super::open_cache()?,
        worker,
        super::session_options(&config),
    );

    if session.in_flight() > 0 {
        note(
            args.quiet,
            if session.is_presentation_loading() {
                "Loading presentation..."
            } else {
                "Syncing with the store..."
            },
        );
        session.settle(wait);
    }
    if let Some(fatal) = session.fatal() {
        anyhow::bail!(
            "{fatal}\nCheck the link, or ask its owner to deploy the script with access set to \"Anyone\"."
        );
    }

    let ui = Ui {
        theme: Theme::from_name(config.theme()),
        config,
        quiet: args.quiet,
        session: Arc::new(Mutex::new(session)),
    };

    let autosave = Ticker::spawn(ui.session.clone(), DEFAULT_TICK);
    let result = ui.event_loop();
    drop(autosave);

    let mut session = ui.session();
    session.flush();
    if !session.settle(wait) {
        eprintln!(
            "{}",
            "Some changes may not have reached the store; they are kept locally.".yellow()
        );
    } else if session.status().state == SyncState::Error {
        eprintln!("{}", render::render_status(session.status()));
    }
    result
}

fn note(quiet: bool, message: &str) {
    if !quiet {
        println!("{}", message.dimmed());
    }
}

impl Ui {
    /// Lock the session. Never hold the guard across a prompt: the autosave
    /// ticker needs it while the user is typing.
    fn session(&self) -> MutexGuard<'_, Live> {
        ticker::lock(&*self.session)
    }

    fn event_loop(&self) -> Result<()> {
        loop {
            let mode = {
                let mut session = self.session();
                session.pump(Instant::now());
                session.mode()
            };
            let flow = match mode {
                Mode::Welcome => self.welcome()?,
                Mode::Edit => self.editor()?,
                Mode::Present => self.presenter()?,
            };
            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn note(&self, message: &str) {
        note(self.quiet, message);
    }

    fn welcome(&self) -> Result<Flow> {
        println!();
        println!("{}", "LimeFlow".green().bold());
        println!("Slides that live in your spreadsheet.");
        println!();

        let options = vec![
            WelcomeAction::Connect,
            WelcomeAction::Offline,
            WelcomeAction::Setup,
            WelcomeAction::Quit,
        ];
        let Some(action) = ask(Select::new("What would you like to do?", options).prompt())?
        else {
            return Ok(Flow::Quit);
        };
        match action {
            WelcomeAction::Connect => self.connect()?,
            WelcomeAction::Offline => report(self.session().enter_edit()),
            WelcomeAction::Setup => super::setup::run(),
            WelcomeAction::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Print the selected slide, and the outline and sync badge when editing.
    fn show(&self, editing: bool) {
        let session = self.session();
        println!();
        println!(
            "{}",
            render::render_slide(
                session.current_slide(),
                session.selected(),
                session.document().len(),
                &self.theme
            )
        );
        if editing {
            println!(
                "{}",
                render::render_outline(session.document(), session.selected(), &self.theme)
            );
            println!("{}", render::render_status(session.status()));
        }
    }

    fn current_slide(&self) -> Slide {
        self.session().current_slide().clone()
    }

    fn editor(&self) -> Result<Flow> {
        self.show(true);

        let Some(action) = ask(
            Select::new("Edit", EditorAction::ALL.to_vec())
                .with_page_size(12)
                .prompt(),
        )?
        else {
            return Ok(Flow::Quit);
        };

        match action {
            EditorAction::Next => {
                self.session().next_slide();
            }
            EditorAction::Previous => {
                self.session().previous_slide();
            }
            EditorAction::Jump => self.jump()?,
            EditorAction::Title => {
                let current = self.current_slide().title;
                if let Some(title) = ask(Text::new("Title").with_initial_value(&current).prompt())? {
                    report(self.session().edit_slide(SlideEdit::Title(title)));
                }
            }
            EditorAction::Subtitle => {
                let current = self.current_slide().subtitle.unwrap_or_default();
                if let Some(subtitle) = ask(
                    Text::new("Subtitle")
                        .with_initial_value(&current)
                        .with_help_message("Leave empty to remove")
                        .prompt(),
                )? {
                    report(self.session().edit_slide(SlideEdit::Subtitle(subtitle)));
                }
            }
            EditorAction::Footer => {
                let current = self.current_slide().footer.unwrap_or_default();
                if let Some(footer) = ask(
                    Text::new("Footer")
                        .with_initial_value(&current)
                        .with_help_message("Leave empty to remove")
                        .prompt(),
                )? {
                    report(self.session().edit_slide(SlideEdit::Footer(footer)));
                }
            }
            EditorAction::Content => self.edit_content()?,
            EditorAction::Layout => {
                let current = self.current_slide().kind;
                let start = SlideType::all()
                    .iter()
                    .position(|k| *k == current)
                    .unwrap_or(0);
                if let Some(kind) = ask(
                    Select::new("Layout", SlideType::all().to_vec())
                        .with_starting_cursor(start)
                        .prompt(),
                )? {
                    report(self.session().edit_slide(SlideEdit::Layout(kind)));
                }
            }
            EditorAction::Add => {
                if let Some(kind) = ask(Select::new("Layout", SlideType::all().to_vec()).prompt())? {
                    report(self.session().add_slide(kind));
                }
            }
            EditorAction::Delete => {
                let len = self.session().document().len();
                if len == 1 {
                    println!("{}", "A deck keeps at least one slide.".yellow());
                } else if ask(
                    Confirm::new("Delete this slide?")
                        .with_default(false)
                        .prompt(),
                )? == Some(true)
                {
                    let mut session = self.session();
                    let selected = session.selected();
                    report(session.delete_slide(selected));
                }
            }
            EditorAction::MoveUp => self.move_selected(Direction::Up),
            EditorAction::MoveDown => self.move_selected(Direction::Down),
            EditorAction::Undo => {
                let mut session = self.session();
                if !session.history().can_undo() {
                    println!("{}", "Nothing to undo.".dimmed());
                }
                report(session.undo());
            }
            EditorAction::Redo => {
                let mut session = self.session();
                if !session.history().can_redo() {
                    println!("{}", "Nothing to redo.".dimmed());
                }
                report(session.redo());
            }
            EditorAction::AiFill => self.ai_fill(),
            EditorAction::AiRedesign => self.ai_redesign()?,
            EditorAction::Present => self.session().enter_present(),
            EditorAction::Connect => self.connect()?,
            EditorAction::Share => self.share(),
            EditorAction::Logout => {
                if ask(
                    Confirm::new("Log out? The local copy and endpoint are removed.")
                        .with_default(false)
                        .prompt(),
                )? == Some(true)
                {
                    let mut session = self.session();
                    // Anything not yet saved goes out before the endpoint is forgotten.
                    session.flush();
                    session.settle(self.config.store_timeout() + SETTLE_MARGIN);
                    report(session.disconnect());
                }
            }
            EditorAction::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn move_selected(&self, direction: Direction) {
        let mut session = self.session();
        let selected = session.selected();
        report(session.move_slide(selected, direction));
    }

    fn presenter(&self) -> Result<Flow> {
        self.show(false);

        let exit = if self.session().is_read_only() {
            "Quit"
        } else {
            "Back to editor"
        };
        let options = vec![
            PresentAction::Next,
            PresentAction::Previous,
            PresentAction::Jump,
            PresentAction::Exit,
        ];
        let Some(action) = ask(
            Select::new("Present", options)
                .with_help_message(&format!("↑↓ to move, enter to select, esc to {exit}"))
                .prompt(),
        )?
        else {
            return Ok(self.leave_presentation());
        };

        match action {
            PresentAction::Next => {
                let advanced = self.session().next_slide();
                if !advanced {
                    println!("{}", "End of presentation.".dimmed());
                }
            }
            PresentAction::Previous => {
                self.session().previous_slide();
            }
            PresentAction::Jump => self.jump()?,
            PresentAction::Exit => return Ok(self.leave_presentation()),
        }
        Ok(Flow::Continue)
    }

    fn leave_presentation(&self) -> Flow {
        let mut session = self.session();
        if session.is_read_only() {
            return Flow::Quit;
        }
        report(session.enter_edit());
        Flow::Continue
    }

    fn jump(&self) -> Result<()> {
        let (labels, selected) = {
            let session = self.session();
            let labels: Vec<String> = session
                .document()
                .slides()
                .iter()
                .enumerate()
                .map(|(i, slide)| format!("{:>2}. {}", i + 1, slide.title))
                .collect();
            (labels, session.selected())
        };
        if let Some(choice) = ask(
            Select::new("Go to slide", labels)
                .with_starting_cursor(selected)
                .raw_prompt(),
        )? {
            self.session().select_slide(choice.index);
        }
        Ok(())
    }

    fn edit_content(&self) -> Result<()> {
        const ADD: &str = "+ Add item";
        let content = self.current_slide().content;
        let mut labels: Vec<String> = content
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect();
        labels.push(ADD.to_string());

        let Some(choice) = ask(Select::new("Content", labels).raw_prompt())? else {
            return Ok(());
        };

        if choice.index == content.len() {
            if let Some(text) = ask(Text::new("New item").prompt())? {
                let mut next = content;
                next.push(text);
                report(self.session().edit_slide(SlideEdit::ReplaceContent(next)));
            }
            return Ok(());
        }

        let index = choice.index;
        let Some(text) = ask(
            Text::new("Item")
                .with_initial_value(&content[index])
                .with_help_message("Leave empty to remove the item")
                .prompt(),
        )?
        else {
            return Ok(());
        };
        let edit = if text.trim().is_empty() {
            SlideEdit::RemoveItem(index)
        } else {
            SlideEdit::SetItem { index, text }
        };
        report(self.session().edit_slide(edit));
        Ok(())
    }

    fn connect(&self) -> Result<()> {
        let current = self.session().config().endpoint.clone();
        let suggestion = self
            .config
            .default_endpoint()
            .unwrap_or(current.as_str())
            .to_string();
        let mut prompt = Text::new("Apps Script web app URL")
            .with_help_message("Run `limeflow setup` to see how to create one");
        if !suggestion.is_empty() {
            prompt = prompt.with_initial_value(&suggestion);
        }
        let Some(endpoint) = ask(prompt.prompt())? else {
            return Ok(());
        };

        let mut session = self.session();
        if let Err(e) = session.connect(&endpoint) {
            println!("{}", e.to_string().red());
            return Ok(());
        }
        self.note("Connecting...");
        session.settle(self.config.store_timeout() + SETTLE_MARGIN);
        println!("{}", render::render_status(session.status()));
        Ok(())
    }

    fn share(&self) {
        let session = self.session();
        if !session.config().has_endpoint() {
            println!(
                "{}",
                "No store connected; the links only open a local deck.".yellow()
            );
        }
        match session.share_links(self.config.share_base()) {
            Ok(links) => {
                println!("{}", "Collaborate (edit):".bold());
                println!("  {}", links.collaborate);
                println!("{}", "Present (read-only):".bold());
                println!("  {}", links.present);
            }
            Err(e) => println!("{}", e.to_string().red()),
        }
    }

    fn generator(&self) -> Result<GeminiGenerator, AiError> {
        let key = self.config.ai_api_key().ok_or(AiError::Unavailable)?;
        Ok(GeminiGenerator::new(key, self.config.ai_model()))
    }

    fn ai_fill(&self) {
        if self.session().is_read_only() {
            report(Err::<(), _>(SessionError::ReadOnly));
            return;
        }
        let slide = self.current_slide();
        self.note("Writing content...");
        let text = self.generator().and_then(|ai| {
            ai.fill_content(
                &slide.content,
                &slide.title,
                slide.subtitle.as_deref().unwrap_or(""),
            )
        });
        match text {
            Ok(text) => report(self.session().apply_generated_content(&text)),
            Err(e) => report(Err::<(), _>(SessionError::from(e))),
        }
    }

    fn ai_redesign(&self) -> Result<()> {
        if self.session().is_read_only() {
            report(Err::<(), _>(SessionError::ReadOnly));
            return Ok(());
        }
        let Some(instruction) = ask(
            Text::new("How should this slide change?")
                .with_help_message("e.g. \"turn this into a SWOT analysis\"")
                .prompt(),
        )?
        else {
            return Ok(());
        };
        let slide = self.current_slide();
        let request = ai::redesign_request(&slide, &instruction);
        self.note("Redesigning...");
        match self
            .generator()
            .and_then(|ai| ai.redesign_slide(&slide.title, &request))
        {
            Ok(json) => report(self.session().apply_redesign(&json)),
            Err(e) => report(Err::<(), _>(SessionError::from(e))),
        }
        Ok(())
    }
}

/// Esc and Ctrl-C become `None`; anything else from the terminal is an error.
fn ask<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Print a rejected edit and carry on.
fn report<T>(result: Result<T, SessionError>) {
    if let Err(e) = result {
        println!("{}", e.to_string().red());
    }
}
