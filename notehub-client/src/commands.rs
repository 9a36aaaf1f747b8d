//! Line commands for the interactive client.

use notehub_core::{NoteId, NoteTag, ParseTagError};

pub const HELP: &str = "\
Commands:
  search <text>     set the search term (empty clears it)
  page <n>          go to page n
  next | prev       move one page
  new | cancel      open or close the create form
  title <text>      set the form title
  content <text>    set the form content
  tag <tag>         Todo, Work, Personal, Meeting or Shopping
  submit            create the note
  delete <id>       delete a note
  dismiss           hide the listing error
  show              print the listing
  help              this text
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Page(u32),
    NextPage,
    PrevPage,
    NewNote,
    Cancel,
    Title(String),
    Content(String),
    Tag(NoteTag),
    Submit,
    Delete(NoteId),
    Dismiss,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Tag(#[from] ParseTagError),
}

/// Parse one input line. Blank lines yield `None`.
///
/// The argument is everything after the first space, untrimmed, so
/// titles and search terms keep their whitespace.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let line = line.trim_start();
    let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));

    let command = match verb.to_ascii_lowercase().as_str() {
        "search" | "s" => Command::Search(arg.to_string()),
        "page" | "p" => {
            let page = arg
                .trim()
                .parse::<u32>()
                .map_err(|_| CommandError::Usage("page <n>"))?;
            Command::Page(page)
        }
        "next" | "n" => Command::NextPage,
        "prev" => Command::PrevPage,
        "new" => Command::NewNote,
        "cancel" => Command::Cancel,
        "title" => Command::Title(arg.to_string()),
        "content" => Command::Content(arg.to_string()),
        "tag" => Command::Tag(arg.parse()?),
        "submit" => Command::Submit,
        "delete" | "d" => {
            let id = arg.trim();
            if id.is_empty() {
                return Err(CommandError::Usage("delete <id>"));
            }
            Command::Delete(NoteId::from(id))
        }
        "dismiss" => Command::Dismiss,
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
