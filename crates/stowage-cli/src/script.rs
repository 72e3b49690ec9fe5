//! Script parsing and execution.
//!
//! One command per line. Blank lines and lines starting with `#` are
//! skipped. Execution stops at the first failing line.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use stowage_types::{
    CreationCollisionOption, DeletionOption, ElementKind, NameCollisionOption, StorageError,
};
use stowage_vfs::{FileSystem, FileSystemExt, StorageFile, StorageFolder};

/// A parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mkdir { path: String, parents: bool },
    Touch { path: String, parents: bool },
    Write { path: String, text: String },
    Cat { path: String },
    Rm { path: String },
    Rmdir { path: String },
    Mv { from: String, to: String, force: bool },
    Cp { from: String, to: String, force: bool },
    Rename { path: String, name: String, force: bool },
    Ls { path: String },
    Stat { path: String },
    Tree { path: Option<String> },
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

/// Consume a leading `flag` if present.
fn take_flag<'a>(rest: &'a str, flag: &str) -> (bool, &'a str) {
    let (word, remainder) = split_word(rest);
    if word == flag {
        (true, remainder)
    } else {
        (false, rest)
    }
}

fn exact_args<const N: usize>(rest: &str, verb: &str) -> Result<[String; N]> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    if words.len() != N {
        bail!(
            "{} expects {} argument(s), got {}",
            verb,
            N,
            words.len()
        );
    }
    Ok(std::array::from_fn(|i| words[i].to_string()))
}

impl Command {
    /// Parse one line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = split_word(line);
        let command = match verb {
            "mkdir" | "touch" => {
                let (parents, rest) = take_flag(rest, "-p");
                let [path] = exact_args(rest, verb)?;
                if verb == "mkdir" {
                    Command::Mkdir { path, parents }
                } else {
                    Command::Touch { path, parents }
                }
            }
            "write" => {
                let (path, text) = split_word(rest);
                if path.is_empty() {
                    bail!("write expects a path and text");
                }
                Command::Write {
                    path: path.to_string(),
                    text: text.to_string(),
                }
            }
            "cat" => {
                let [path] = exact_args(rest, verb)?;
                Command::Cat { path }
            }
            "rm" => {
                let [path] = exact_args(rest, verb)?;
                Command::Rm { path }
            }
            "rmdir" => {
                let [path] = exact_args(rest, verb)?;
                Command::Rmdir { path }
            }
            "mv" | "cp" => {
                let (force, rest) = take_flag(rest, "-f");
                let [from, to] = exact_args(rest, verb)?;
                if verb == "mv" {
                    Command::Mv { from, to, force }
                } else {
                    Command::Cp { from, to, force }
                }
            }
            "rename" => {
                let (force, rest) = take_flag(rest, "-f");
                let [path, name] = exact_args(rest, verb)?;
                Command::Rename { path, name, force }
            }
            "ls" => {
                let [path] = exact_args(rest, verb)?;
                Command::Ls { path }
            }
            "stat" => {
                let [path] = exact_args(rest, verb)?;
                Command::Stat { path }
            }
            "tree" => {
                let words: Vec<&str> = rest.split_whitespace().collect();
                match words.as_slice() {
                    [] => Command::Tree { path: None },
                    [path] => Command::Tree {
                        path: Some(path.to_string()),
                    },
                    _ => bail!("tree expects at most one argument"),
                }
            }
            other => bail!("unknown command {:?}", other),
        };
        Ok(Some(command))
    }
}

enum TreeEntry {
    Folder(StorageFolder),
    File(StorageFile),
}

async fn tree_children(folder: &StorageFolder) -> Result<Vec<TreeEntry>> {
    let mut entries: Vec<TreeEntry> = folder
        .list_folders()
        .await?
        .into_iter()
        .map(TreeEntry::Folder)
        .collect();
    entries.extend(folder.list_files().await?.into_iter().map(TreeEntry::File));
    Ok(entries)
}

fn collision(force: bool) -> NameCollisionOption {
    if force {
        NameCollisionOption::ReplaceExisting
    } else {
        NameCollisionOption::Fail
    }
}

/// Executes commands against one filesystem, writing output to `out`.
pub struct Runner<W: Write> {
    fs: Arc<dyn FileSystem>,
    out: W,
}

impl<W: Write> Runner<W> {
    pub fn new(fs: Arc<dyn FileSystem>, out: W) -> Self {
        Self { fs, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run every line of `script`, stopping at the first error.
    pub async fn run(&mut self, script: &str) -> Result<()> {
        let mut executed = 0;
        for (number, line) in script.lines().enumerate() {
            let context = || format!("line {}: {}", number + 1, line.trim());
            let Some(command) = Command::parse(line).with_context(context)? else {
                continue;
            };
            tracing::debug!(?command, "executing");
            self.execute(command).await.with_context(context)?;
            executed += 1;
        }
        tracing::info!(executed, "script finished");
        Ok(())
    }

    fn separator(&self) -> char {
        self.fs.path_information().directory_separator
    }

    async fn kind_of(&self, path: &str) -> Result<ElementKind> {
        if self.fs.file(path)?.exists().await? {
            Ok(ElementKind::File)
        } else if self.fs.folder(path)?.exists().await? {
            Ok(ElementKind::Folder)
        } else {
            Err(StorageError::not_found(path).into())
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Mkdir { path, parents } => {
                let option = if parents {
                    CreationCollisionOption::UseExisting
                } else {
                    CreationCollisionOption::Fail
                };
                self.fs.folder(&path)?.create(parents, option).await?;
            }
            Command::Touch { path, parents } => {
                self.fs
                    .file(&path)?
                    .create(parents, CreationCollisionOption::UseExisting)
                    .await?;
            }
            Command::Write { path, text } => {
                let file = self.fs.file(&path)?;
                file.create(false, CreationCollisionOption::UseExisting)
                    .await?;
                file.write_text(&text, None).await?;
            }
            Command::Cat { path } => {
                let text = self.fs.file(&path)?.read_text(None).await?;
                writeln!(self.out, "{}", text)?;
            }
            Command::Rm { path } => {
                self.fs.file(&path)?.delete(DeletionOption::Fail).await?;
            }
            Command::Rmdir { path } => {
                self.fs.folder(&path)?.delete(DeletionOption::Fail).await?;
            }
            Command::Mv { from, to, force } => {
                let destination = self.fs.get_path(&to)?;
                match self.kind_of(&from).await? {
                    ElementKind::File => {
                        self.fs
                            .file(&from)?
                            .move_to(&destination, collision(force))
                            .await?;
                    }
                    ElementKind::Folder => {
                        self.fs
                            .folder(&from)?
                            .move_to(&destination, collision(force))
                            .await?;
                    }
                }
            }
            Command::Cp { from, to, force } => {
                let destination = self.fs.get_path(&to)?;
                match self.kind_of(&from).await? {
                    ElementKind::File => {
                        self.fs
                            .file(&from)?
                            .copy_to(&destination, collision(force))
                            .await?;
                    }
                    ElementKind::Folder => {
                        self.fs
                            .folder(&from)?
                            .copy_to(&destination, collision(force))
                            .await?;
                    }
                }
            }
            Command::Rename { path, name, force } => match self.kind_of(&path).await? {
                ElementKind::File => {
                    self.fs.file(&path)?.rename(&name, collision(force)).await?;
                }
                ElementKind::Folder => {
                    self.fs
                        .folder(&path)?
                        .rename(&name, collision(force))
                        .await?;
                }
            },
            Command::Ls { path } => {
                let folder = self.fs.folder(&path)?;
                let sep = self.separator();
                for child in folder.list_folders().await? {
                    writeln!(self.out, "{}{}", child.name(), sep)?;
                }
                for child in folder.list_files().await? {
                    writeln!(self.out, "{}", child.name())?;
                }
            }
            Command::Stat { path } => {
                let value = match self.kind_of(&path).await? {
                    ElementKind::File => {
                        let file = self.fs.file(&path)?;
                        serde_json::json!({
                            "path": file.path().as_str(),
                            "kind": ElementKind::File,
                            "attributes": file.attributes().await?,
                            "properties": file.properties().await?,
                        })
                    }
                    ElementKind::Folder => {
                        let folder = self.fs.folder(&path)?;
                        serde_json::json!({
                            "path": folder.path().as_str(),
                            "kind": ElementKind::Folder,
                            "attributes": folder.attributes().await?,
                            "properties": folder.properties().await?,
                        })
                    }
                };
                writeln!(self.out, "{}", serde_json::to_string_pretty(&value)?)?;
            }
            Command::Tree { path } => {
                let root = match path {
                    Some(path) => self.fs.folder(&path)?,
                    None => self.fs.folder(&self.separator().to_string())?,
                };
                self.tree(root).await?;
            }
        }
        Ok(())
    }

    async fn tree(&mut self, root: StorageFolder) -> Result<()> {
        let sep = self.separator();
        writeln!(self.out, "{}", root.path())?;
        let mut stack: Vec<(TreeEntry, usize)> = tree_children(&root)
            .await?
            .into_iter()
            .rev()
            .map(|entry| (entry, 1))
            .collect();

        while let Some((entry, depth)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match entry {
                TreeEntry::File(file) => writeln!(self.out, "{}{}", indent, file.name())?,
                TreeEntry::Folder(folder) => {
                    writeln!(self.out, "{}{}{}", indent, folder.name(), sep)?;
                    for child in tree_children(&folder).await?.into_iter().rev() {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }
        Ok(())
    }
}
