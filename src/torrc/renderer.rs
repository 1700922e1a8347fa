//! Writing resolved directives to disk

use std::io;
use std::path::PathBuf;

use uuid::Uuid;

use super::TorrcDirectives;

/// A torrc written to the system temp dir, ready to hand to the tor child
#[derive(Debug, Clone)]
pub struct RenderedTorrc {
    pub path: PathBuf,
    pub text: String,
}

/// Join directives into file text, one per line, with a trailing newline
pub fn render(directives: &TorrcDirectives) -> String {
    let mut text = directives.lines().join("\n");
    text.push('\n');
    text
}

/// Write the directives to a uniquely named `tortray_<uuid>.torrc` in the
/// system temp dir. The supervisor removes the file again during teardown.
pub fn render_to_temp(directives: &TorrcDirectives) -> io::Result<RenderedTorrc> {
    let text = render(directives);
    let path = std::env::temp_dir().join(format!("tortray_{}.torrc", Uuid::new_v4()));
    std::fs::write(&path, &text)?;
    Ok(RenderedTorrc { path, text })
}
