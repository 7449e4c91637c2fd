use crawl_core::{FormFields, Msg};

pub const HELP: &str = "\
Commands:
  url <value>              set the seed URL
  depth <value>            set the crawl depth
  filter <start>|||<end>   add a filter rule
  filters clear            remove all filter rules
  submit                   start the crawl
  cancel                   stop watching the job (or go back after a failure)
  zip                      download the archive export
  pdf                      generate and download the PDF export
  new                      start over with an empty form
  help                     show this list
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Url(String),
    Depth(String),
    AddFilter(String),
    ClearFilters,
    Submit,
    Cancel,
    ArchiveExport,
    DocumentExport,
    New,
    Help,
    Quit,
}

impl Command {
    /// Messages for the controller. The current form is needed to append filter lines.
    pub fn into_msgs(self, form: &FormFields) -> Vec<Msg> {
        match self {
            Command::Url(url) => vec![Msg::UrlChanged(url)],
            Command::Depth(depth) => vec![Msg::DepthChanged(depth)],
            Command::AddFilter(line) => {
                let mut filters = form.filters.clone();
                if !filters.is_empty() && !filters.ends_with('\n') {
                    filters.push('\n');
                }
                filters.push_str(&line);
                vec![Msg::FiltersChanged(filters)]
            }
            Command::ClearFilters => vec![Msg::FiltersChanged(String::new())],
            Command::Submit => vec![Msg::SubmitClicked],
            Command::Cancel => vec![Msg::CancelClicked],
            Command::ArchiveExport => vec![Msg::ArchiveExportClicked],
            Command::DocumentExport => vec![Msg::DocumentExportClicked],
            Command::New => vec![Msg::ResetClicked],
            Command::Help | Command::Quit => Vec::new(),
        }
    }
}

/// Parses one input line. `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match (word.to_ascii_lowercase().as_str(), rest) {
        ("url", value) if !value.is_empty() => Command::Url(value.to_string()),
        ("depth", value) if !value.is_empty() => Command::Depth(value.to_string()),
        ("filter", value) if !value.is_empty() => Command::AddFilter(value.to_string()),
        ("filters", "clear") => Command::ClearFilters,
        ("submit", "") | ("start", "") => Command::Submit,
        ("cancel", "") | ("back", "") => Command::Cancel,
        ("zip", "") => Command::ArchiveExport,
        ("pdf", "") => Command::DocumentExport,
        ("new", "") | ("reset", "") => Command::New,
        ("help", "") | ("?", "") => Command::Help,
        ("quit", "") | ("exit", "") => Command::Quit,
        (word, _) => return Err(format!("unknown command {word:?}; type `help`")),
    };
    Ok(Some(command))
}
