//! core/tags/mkv.rs
//! Playtag in Matroska/WebM files, through mkvtoolnix.
//!
//! No native library here, so every operation is a round trip:
//! 1. `mkvextract tags FILE` prints the tag document as XML
//! 2. edit the document: one `<Tag>` holding
//!    `<Simple><Name>PLAYTAG</Name><String>...</String></Simple>`
//! 3. write it to a temporary `.xml` file
//! 4. `mkvpropedit FILE --tags all:TMP`
//!
//! The temporary file is a `NamedTempFile`, removed when it goes out of scope
//! whether the tool succeeded or not.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::xml::Element;
use super::{MetadataHandler, PLAYTAG_KEY};
use crate::core::config::Config;
use crate::core::error::{PlaytagError, Result};
use crate::core::types::ContainerFamily;

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE Tags SYSTEM \"matroskatags.dtd\">\n";

/// The two external tool actions the handler needs.
pub trait TagTool {
    /// Current tag document of `file` as XML. Empty when the file has no tags.
    fn extract_tags(&self, file: &Path) -> Result<String>;

    /// Replace all tags of `file` with the document stored at `xml`.
    fn apply_tags(&self, file: &Path, xml: &Path) -> Result<()>;
}

/// The real mkvtoolnix binaries.
#[derive(Debug, Clone)]
pub struct Mkvtoolnix {
    pub mkvextract: PathBuf,
    pub mkvpropedit: PathBuf,
    /// Let the tools talk to the terminal.
    pub verbose: bool,
}

impl Mkvtoolnix {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mkvextract: config.mkvextract.clone(),
            mkvpropedit: config.mkvpropedit.clone(),
            verbose: config.debug,
        }
    }

    fn chatter(&self) -> Stdio {
        if self.verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

fn tool_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

impl TagTool for Mkvtoolnix {
    fn extract_tags(&self, file: &Path) -> Result<String> {
        let tool = tool_name(&self.mkvextract);
        tracing::debug!("Running {tool} tags {}", file.display());

        let output = Command::new(&self.mkvextract)
            .arg("tags")
            .arg(file)
            .stdin(Stdio::null())
            .stderr(self.chatter())
            .output()
            .map_err(|e| PlaytagError::tool(&tool, e.to_string()))?;

        if !output.status.success() {
            return Err(PlaytagError::tool(tool, output.status.to_string()));
        }

        let xml = String::from_utf8(output.stdout)
            .map_err(|e| PlaytagError::tool(&tool, format!("output is not UTF-8: {e}")))?;
        tracing::debug!("{tool} output length: {} bytes", xml.len());
        Ok(xml)
    }

    fn apply_tags(&self, file: &Path, xml: &Path) -> Result<()> {
        let tool = tool_name(&self.mkvpropedit);
        let mut tags_arg = std::ffi::OsString::from("all:");
        tags_arg.push(xml);
        tracing::debug!("Running {tool} {} --tags {:?}", file.display(), tags_arg);

        let status = Command::new(&self.mkvpropedit)
            .arg(file)
            .arg("--tags")
            .arg(&tags_arg)
            .stdin(Stdio::null())
            .stdout(self.chatter())
            .stderr(self.chatter())
            .status()
            .map_err(|e| PlaytagError::tool(&tool, e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(PlaytagError::tool(tool, status.to_string()))
        }
    }
}

pub struct ExternalToolHandler<'t> {
    path: PathBuf,
    tool: &'t dyn TagTool,
    /// False if the file was missing at construction; every call is refused.
    valid: bool,
}

impl<'t> ExternalToolHandler<'t> {
    pub fn new(path: &Path, tool: &'t dyn TagTool) -> Self {
        let valid = path.is_file();
        if !valid {
            tracing::error!("MKV file not found: {}", path.display());
        }
        Self {
            path: path.to_path_buf(),
            tool,
            valid,
        }
    }

    fn check_valid(&self) -> bool {
        if !self.valid {
            tracing::error!(
                "MKV file '{}' is not considered valid. Refusing to touch it.",
                self.path.display()
            );
        }
        self.valid
    }

    /// Current tag document, or `None` when the file carries no tags at all.
    fn load(&self) -> Result<Option<Element>> {
        let xml = self.tool.extract_tags(&self.path)?;
        if xml.trim().is_empty() {
            tracing::debug!("No tags found in MKV file");
            return Ok(None);
        }

        let root = Element::parse(&xml)
            .map_err(|e| PlaytagError::tool("mkvextract", format!("unparseable tags XML: {e}")))?;
        if root.name != "Tags" {
            return Err(PlaytagError::tool(
                "mkvextract",
                format!("unexpected root element <{}>", root.name),
            ));
        }
        Ok(Some(root))
    }

    fn store(&self, doc: &Element) -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix("playtag_mkv")
            .suffix(".xml")
            .tempfile()
            .map_err(|e| PlaytagError::io(std::env::temp_dir(), e))?;

        write_document(&mut tmp, doc).map_err(|e| PlaytagError::io(tmp.path(), e))?;

        self.tool.apply_tags(&self.path, tmp.path())
    }

    fn try_replace(&self, value: &str) -> Result<()> {
        let mut doc = self.load()?.unwrap_or_else(|| Element::new("Tags"));
        set_playtag(&mut doc, value);
        self.store(&doc)
    }

    fn try_clear(&self) -> Result<()> {
        let Some(mut doc) = self.load()? else {
            return Ok(());
        };
        if remove_playtag(&mut doc) == 0 {
            tracing::debug!("No PLAYTAG in MKV tags, nothing to clear");
            return Ok(());
        }
        self.store(&doc)
    }
}

impl MetadataHandler for ExternalToolHandler<'_> {
    fn family(&self) -> ContainerFamily {
        ContainerFamily::ExternalToolManaged
    }

    fn read(&self) -> Option<String> {
        if !self.check_valid() {
            return None;
        }
        match self.load() {
            Ok(doc) => {
                let value = doc.as_ref().and_then(playtag_of);
                tracing::debug!("MKV PLAYTAG: {value:?}");
                value
            }
            Err(e) => {
                tracing::error!("Error reading MKV tags: {e}");
                None
            }
        }
    }

    fn replace(&mut self, value: &str) -> bool {
        if !self.check_valid() {
            return false;
        }
        match self.try_replace(value) {
            Ok(()) => {
                tracing::debug!("Successfully wrote PLAYTAG to MKV file");
                true
            }
            Err(e) => {
                tracing::error!("Error writing MKV tags: {e}");
                false
            }
        }
    }

    fn clear(&mut self) -> bool {
        if !self.check_valid() {
            return false;
        }
        match self.try_clear() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error clearing MKV tags: {e}");
                false
            }
        }
    }
}

fn write_document(out: &mut impl Write, doc: &Element) -> std::io::Result<()> {
    out.write_all(XML_HEADER.as_bytes())?;
    out.write_all(doc.to_xml().as_bytes())?;
    out.flush()
}

fn is_playtag_simple(simple: &Element) -> bool {
    simple.name == "Simple" && simple.child("Name").is_some_and(|n| n.text == PLAYTAG_KEY)
}

/// Non-empty `<String>` of the first PLAYTAG `<Simple>`.
pub(crate) fn playtag_of(tags: &Element) -> Option<String> {
    tags.children_named("Tag")
        .flat_map(|tag| tag.children.iter())
        .filter(|s| is_playtag_simple(s))
        .find_map(|s| s.child("String").map(|v| v.text.clone()))
        .filter(|v| !v.is_empty())
}

/// Remove PLAYTAG `<Simple>` elements except the one at `keep`
/// (`(tag index, simple index)`), then drop any `<Tag>` this emptied.
/// Returns how many were removed.
fn prune_playtag(tags: &mut Element, keep: Option<(usize, usize)>) -> usize {
    let mut removed = 0;
    let mut emptied = Vec::new();

    for (ti, tag) in tags.children.iter_mut().enumerate() {
        if tag.name != "Tag" {
            continue;
        }
        let before = tag.children.len();
        let mut si = 0;
        tag.children.retain(|c| {
            let stays = keep == Some((ti, si)) || !is_playtag_simple(c);
            si += 1;
            stays
        });
        let dropped = before - tag.children.len();
        removed += dropped;
        if dropped > 0 && tag.child("Simple").is_none() {
            emptied.push(ti);
        }
    }

    for ti in emptied.into_iter().rev() {
        tags.children.remove(ti);
    }
    removed
}

/// Remove every PLAYTAG `<Simple>`; a `<Tag>` left without any `<Simple>`
/// goes too. Returns how many were removed.
pub(crate) fn remove_playtag(tags: &mut Element) -> usize {
    prune_playtag(tags, None)
}

/// Make sure exactly one PLAYTAG `<Simple>` exists and holds `value`.
pub(crate) fn set_playtag(tags: &mut Element, value: &str) {
    let found = tags
        .children
        .iter()
        .enumerate()
        .filter(|(_, t)| t.name == "Tag")
        .find_map(|(ti, t)| t.children.iter().position(is_playtag_simple).map(|si| (ti, si)));

    let (ti, si) = match found {
        Some(pos) => {
            // everything pruned comes after `pos`, so the indices stay valid
            let dropped = prune_playtag(tags, Some(pos));
            if dropped > 0 {
                tracing::debug!("Dropped {dropped} duplicate PLAYTAG entries");
            }
            pos
        }
        None => {
            let mut simple = Element::new("Simple");
            simple.children.push(Element::with_text("Name", PLAYTAG_KEY));
            let mut tag = Element::new("Tag");
            tag.children.push(simple);
            tags.children.push(tag);
            (tags.children.len() - 1, 0)
        }
    };

    tags.children[ti].children[si].child_or_insert("String").text = value.to_string();
}
