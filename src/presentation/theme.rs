use colored::Colorize;

pub struct Theme {
    pub title: fn(&str) -> String,
    pub label: fn(&str) -> String,
    pub line: fn(&str) -> String,
    pub idx: fn(&str) -> String,
    pub ingredient: fn(&str) -> String,
    pub step: fn(&str) -> String,
    pub url: fn(&str) -> String,
    pub note: fn(&str) -> String,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "temp" | "" => Self::temp(),
            "plain" => Self::plain(),
            "canvas" => Self::canvas(),
            _ => {
                eprintln!("{}", format!("✘ Unknown theme: {}", name).red());
                Self::temp() // Fallback to default
            }
        }
    }

    fn temp() -> Self {
        Self {
            title: |s| s.bright_magenta().italic().bold().underline().to_string(),
            label: |s| s.cyan().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            idx: |s| s.bright_white().to_string(),
            ingredient: |s| s.white().to_string(),
            step: |s| s.bright_white().dimmed().to_string(),
            url: |s| s.blue().underline().to_string(),
            note: |s| s.bright_white().dimmed().italic().to_string(),
        }
    }

    fn plain() -> Self {
        Self {
            title: |s| s.bold().to_string(),
            label: |s| s.normal().to_string(),
            line: |s| s.normal().to_string(),
            idx: |s| s.normal().to_string(),
            ingredient: |s| s.normal().to_string(),
            step: |s| s.normal().to_string(),
            url: |s| s.normal().to_string(),
            note: |s| s.normal().to_string(),
        }
    }

    fn canvas() -> Self {
        Self {
            title: |s| s.blue().bold().underline().to_string(),
            label: |s| s.bright_cyan().bold().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            idx: |s| s.cyan().to_string(),
            ingredient: |s| s.black().to_string(),
            step: |s| s.bright_black().italic().to_string(),
            url: |s| s.bright_blue().to_string(),
            note: |s| s.bright_black().italic().to_string(),
        }
    }
}
