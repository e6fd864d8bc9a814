use colored::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub foreground: Color,
    pub heading_color: Color,
    pub accent: Color,
    pub muted: Color,
    /// Width of the slide frame in columns.
    pub width: usize,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            foreground: Color::TrueColor {
                r: 0xC8,
                g: 0xC8,
                b: 0xC8,
            },
            heading_color: Color::White,
            accent: Color::TrueColor {
                r: 0xA3,
                g: 0xE6,
                b: 0x35,
            },
            muted: Color::BrightBlack,
            width: 72,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            foreground: Color::TrueColor {
                r: 0x1A,
                g: 0x1A,
                b: 0x2E,
            },
            heading_color: Color::TrueColor {
                r: 0x16,
                g: 0x21,
                b: 0x3E,
            },
            accent: Color::TrueColor {
                r: 0x4D,
                g: 0x7C,
                b: 0x0F,
            },
            muted: Color::BrightBlack,
            width: 72,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark").name, "dark");
        assert_eq!(Theme::from_name("light").name, "light");
        assert_eq!(Theme::from_name("anything").name, "light");
    }
}
