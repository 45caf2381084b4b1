use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use richdoc::{
    export_docx, import_docx, merge_chapters, parse_html, render_html, ChapterData, Content,
    DirImageStore, DocumentSettings, ImportConfig, MergeOptions, StyleSheet,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse editor HTML into content.json and stylesheet.json.
    Parse {
        #[arg(long)]
        html_file: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Render content + stylesheet back to editor HTML.
    Render {
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        stylesheet: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export content + stylesheet as a .docx package.
    ExportDocx {
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        stylesheet: PathBuf,
        /// DocumentSettings JSON (margins, heading styles, numbering).
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Import a .docx package as chapters.
    ImportDocx {
        #[arg(long)]
        docx: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        /// Deepest heading level that starts a chapter (1-6).
        #[arg(long)]
        max_heading_level: Option<u8>,
        /// Title of the chapter holding content before the first heading.
        #[arg(long)]
        default_title: Option<String>,
    },
    /// Merge a chapters.json produced by import-docx and export it.
    ExportChapters {
        #[arg(long)]
        chapters: PathBuf,
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Leave out the per-chapter title headings.
        #[arg(long)]
        no_titles: bool,
        /// Separate chapters with a divider.
        #[arg(long)]
        dividers: bool,
        #[arg(long)]
        out: PathBuf,
    },
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn write_file(path: &Path, data: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("write {}", path.display()))
}

fn load_settings(path: Option<&Path>) -> Result<Option<DocumentSettings>> {
    path.map(|p| {
        DocumentSettings::from_json(&read_text(p)?)
            .with_context(|| format!("decode settings {}", p.display()))
    })
    .transpose()
}

fn load_model(content: &Path, stylesheet: &Path) -> Result<(Content, StyleSheet)> {
    let content = Content::from_json(&read_text(content)?)
        .with_context(|| format!("decode content {}", content.display()))?;
    let sheet = StyleSheet::from_json(&read_text(stylesheet)?)
        .with_context(|| format!("decode stylesheet {}", stylesheet.display()))?;
    Ok((content, sheet))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Parse { html_file, out_dir } => {
            let (content, sheet) = parse_html(&read_text(&html_file)?);
            write_file(&out_dir.join("content.json"), content.to_json()?)?;
            write_file(&out_dir.join("stylesheet.json"), sheet.to_json()?)?;
            info!(
                "parsed {} blocks, {} style rules",
                content.blocks.len(),
                sheet.rules.len()
            );
        }
        Command::Render {
            content,
            stylesheet,
            out,
        } => {
            let (content, sheet) = load_model(&content, &stylesheet)?;
            let html = render_html(&content, &sheet).context("render html")?;
            match out {
                Some(path) => write_file(&path, html)?,
                None => println!("{html}"),
            }
        }
        Command::ExportDocx {
            content,
            stylesheet,
            settings,
            out,
        } => {
            let (content, sheet) = load_model(&content, &stylesheet)?;
            let settings = load_settings(settings.as_deref())?;
            let bytes = export_docx(&content, &sheet, settings.as_ref()).context("export docx")?;
            write_file(&out, bytes)?;
            info!("wrote {}", out.display());
        }
        Command::ImportDocx {
            docx,
            out_dir,
            max_heading_level,
            default_title,
        } => {
            let mut config = ImportConfig::from_env().context("import configuration")?;
            if let Some(level) = max_heading_level {
                config.max_heading_level = level;
            }
            if let Some(title) = default_title {
                config.default_chapter_title = title;
            }
            let bytes = fs::read(&docx).with_context(|| format!("read {}", docx.display()))?;
            let mut store = DirImageStore::new(out_dir.join("images"), "images");
            let result = import_docx(&bytes, &config, &mut store)
                .with_context(|| format!("import {}", docx.display()))?;
            write_file(
                &out_dir.join("chapters.json"),
                serde_json::to_string_pretty(&result.chapters)?,
            )?;
            write_file(
                &out_dir.join("page_settings.json"),
                serde_json::to_string_pretty(&result.page_settings)?,
            )?;
            info!(
                "wrote {} chapters and {} images to {}",
                result.chapters.len(),
                result.images.len(),
                out_dir.display()
            );
        }
        Command::ExportChapters {
            chapters,
            settings,
            no_titles,
            dividers,
            out,
        } => {
            let list: Vec<ChapterData> = serde_json::from_str(&read_text(&chapters)?)
                .with_context(|| format!("decode chapters {}", chapters.display()))?;
            if list.is_empty() {
                return Err(anyhow!("{} holds no chapters", chapters.display()));
            }
            let (content, sheet) = merge_chapters(
                &list,
                MergeOptions {
                    include_titles: !no_titles,
                    dividers_between: dividers,
                },
            );
            let settings = load_settings(settings.as_deref())?;
            let bytes = export_docx(&content, &sheet, settings.as_ref()).context("export docx")?;
            write_file(&out, bytes)?;
            info!("merged {} chapters into {}", list.len(), out.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Args::parse().command)
}
