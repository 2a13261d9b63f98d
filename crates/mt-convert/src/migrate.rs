//! Per-file conversion pipeline.
//!
//! Every conversion reads one input, writes its intermediate files into a
//! working folder, runs the [`Converter`] and writes the repaired result:
//!
//! | step                | input             | intermediate                        | output           |
//! |---------------------|-------------------|-------------------------------------|------------------|
//! | [`Migrator::convert_rst`]      | `rst/a/b.rst`     | `convert/a/b.prep.rst`, `b.tmp.md`  | `docs/a/b.md`    |
//! | [`Migrator::convert_markdown`] | `docs/a/b.md`     | `upload/a/b.prep.md`                | `upload/a/b.html`|
//! | [`Migrator::convert_html`]     | `x/b.fr.html`     | `x/b.fr.tmp.html`, `x/b.fr.tmp.md`  | `x/b.fr.md`      |

use std::path::{Path, PathBuf};

use mt_config::ProjectConfig;
use mt_engine::{Context, FileScope, FsSource, Warnings, paths, postprocess, preprocess, roundtrip};

use crate::converter::{Converter, MARKDOWN_IN, MARKDOWN_OUT};
use crate::error::ConvertError;
use crate::write::{read, write_atomic};

/// Result of a successful conversion.
#[derive(Debug)]
pub struct Converted {
    pub output: PathBuf,
    pub warnings: Warnings,
}

/// Converts files between the project folders.
pub struct Migrator<'a> {
    project: &'a ProjectConfig,
    converter: &'a dyn Converter,
}

impl<'a> Migrator<'a> {
    pub fn new(project: &'a ProjectConfig, converter: &'a dyn Converter) -> Self {
        Self { project, converter }
    }

    /// Migrate one reStructuredText file into the docs folder.
    pub fn convert_rst(&self, ctx: &Context, rst_file: &Path) -> Result<Converted, ConvertError> {
        require_input(rst_file, "rst")?;
        let rst_dir = &self.project.rst_dir;
        if !rst_file.starts_with(rst_dir) {
            return Err(ConvertError::OutsideRoot {
                path: rst_file.to_path_buf(),
                root: rst_dir.clone(),
            });
        }

        let doc = paths::corpus_path(rst_dir, rst_file);
        let md_file = self.project.docs_dir.join(paths::with_extension(&doc, "md"));
        let working = self.project.convert_dir.join(&doc);
        let rst_prep = working.with_extension("prep.rst");
        let md_tmp = working.with_extension("tmp.md");

        let source = FsSource::new(rst_dir.clone());
        let mut scope = FileScope::new(ctx, &doc, &source);
        let text = read(rst_file)?;
        let prepared = preprocess(&mut scope, &text);
        write_atomic(&rst_prep, &prepared)?;

        self.converter.convert("rst", MARKDOWN_OUT, &rst_prep, &md_tmp)?;

        let converted = read(&md_tmp)?;
        let markdown = postprocess(ctx, &doc, &converted).map_err(|source| ConvertError::Fence {
            path: rst_file.to_path_buf(),
            source,
        })?;
        write_atomic(&md_file, &markdown)?;

        let warnings = scope.into_warnings();
        tracing::info!(path = %md_file.display(), warnings = warnings.len(), "Migrated");
        Ok(Converted {
            output: md_file,
            warnings,
        })
    }

    /// Convert a Markdown page to HTML in the upload folder, ready for translation.
    pub fn convert_markdown(&self, md_file: &Path) -> Result<PathBuf, ConvertError> {
        require_input(md_file, "md")?;

        let html_file = self
            .project
            .upload_dir
            .join(self.docs_relative(md_file))
            .with_extension("html");
        let md_prep = html_file.with_extension("prep.md");

        let text = read(md_file)?;
        write_atomic(&md_prep, &roundtrip::markdown_to_fenced(&text))?;
        self.converter.convert(MARKDOWN_IN, "html", &md_prep, &html_file)?;

        tracing::info!(path = %html_file.display(), "Converted to html");
        Ok(html_file)
    }

    /// Convert translated HTML back to Markdown beside it.
    pub fn convert_html(&self, html_file: &Path) -> Result<PathBuf, ConvertError> {
        require_input(html_file, "html")?;

        let html_tmp = html_file.with_extension("tmp.html");
        let md_tmp = html_file.with_extension("tmp.md");
        let md_file = html_file.with_extension("md");

        let html = read(html_file)?;
        write_atomic(&html_tmp, &roundtrip::clean_translated_html(&html))?;
        self.converter.convert("html", MARKDOWN_OUT, &html_tmp, &md_tmp)?;

        let markdown = read(&md_tmp)?;
        write_atomic(&md_file, &roundtrip::clean_translated_markdown(&markdown))?;

        tracing::info!(path = %md_file.display(), "Converted to markdown");
        Ok(md_file)
    }

    /// Write a copy of `html_file` with code protected from translation.
    ///
    /// Returns the path of the copy to upload.
    pub fn protect_for_translation(&self, html_file: &Path) -> Result<PathBuf, ConvertError> {
        require_input(html_file, "html")?;
        let upload = html_file.with_extension("tmp.html");
        let html = read(html_file)?;
        write_atomic(&upload, &roundtrip::protect_code(&html))?;
        Ok(upload)
    }

    /// Where the translation of an uploaded HTML file is downloaded to.
    ///
    /// `upload/a/b.html` becomes `download/a/b.fr.html` for target language `FR`.
    pub fn translated_path(&self, html_file: &Path, target_lang: &str) -> PathBuf {
        let relative = html_file
            .strip_prefix(&self.project.upload_dir)
            .map_or_else(|_| file_name(html_file), Path::to_path_buf);
        self.project
            .download_dir
            .join(relative)
            .with_extension(format!("{}.html", target_lang.to_lowercase()))
    }

    /// Path of `md_file` below the docs folder, or just its name when outside.
    fn docs_relative(&self, md_file: &Path) -> PathBuf {
        md_file
            .strip_prefix(&self.project.docs_dir)
            .map_or_else(|_| file_name(md_file), Path::to_path_buf)
    }
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

fn require_input(path: &Path, expected: &'static str) -> Result<(), ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::MissingInput(path.to_path_buf()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(expected) {
        return Err(ConvertError::Extension {
            path: path.to_path_buf(),
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use mt_engine::AnchorIndex;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    /// Copies input to output and records each call.
    #[derive(Default)]
    struct CopyConverter {
        calls: Mutex<Vec<(String, String)>>,
        output: Option<&'static str>,
    }

    impl Converter for CopyConverter {
        fn convert(
            &self,
            from: &str,
            to: &str,
            input: &Path,
            output: &Path,
        ) -> Result<(), ConvertError> {
            self.calls
                .lock()
                .unwrap()
                .push((from.to_owned(), to.to_owned()));
            match self.output {
                Some(text) => fs::write(output, text).unwrap(),
                None => {
                    fs::copy(input, output).unwrap();
                }
            }
            Ok(())
        }
    }

    fn project(root: &Path) -> ProjectConfig {
        ProjectConfig {
            project_dir: root.to_path_buf(),
            docs_dir: root.join("docs"),
            rst_dir: root.join("rst"),
            build_dir: root.join("target"),
            upload_dir: root.join("target/upload"),
            convert_dir: root.join("target/convert"),
            download_dir: root.join("target/download"),
            anchor_file: root.join("target/convert/anchors.txt"),
            ..ProjectConfig::default()
        }
    }

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_convert_rst_paths_and_passes() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let rst = dir.path().join("rst/install/docker.rst");
        write(&rst, "Edit :file:`config.xml`.\n");

        let converter = CopyConverter::default();
        let migrator = Migrator::new(&project, &converter);
        let ctx = Context::new(AnchorIndex::new());
        let converted = migrator.convert_rst(&ctx, &rst).unwrap();

        assert_eq!(converted.output, dir.path().join("docs/install/docker.md"));
        assert!(dir.path().join("target/convert/install/docker.prep.rst").exists());
        assert!(dir.path().join("target/convert/install/docker.tmp.md").exists());
        assert_eq!(
            fs::read_to_string(&converted.output).unwrap(),
            "Edit **`config.xml`**.\n"
        );
        assert_eq!(
            converter.calls.lock().unwrap()[0],
            ("rst".to_owned(), MARKDOWN_OUT.to_owned())
        );
    }

    #[test]
    fn test_convert_rst_rejects_outside_file() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let rst = dir.path().join("elsewhere/page.rst");
        write(&rst, "Text\n");

        let converter = CopyConverter::default();
        let migrator = Migrator::new(&project, &converter);
        let result = migrator.convert_rst(&Context::default(), &rst);
        assert!(matches!(result, Err(ConvertError::OutsideRoot { .. })));
    }

    #[test]
    fn test_convert_rst_missing_and_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let converter = CopyConverter::default();
        let migrator = Migrator::new(&project, &converter);

        let missing = dir.path().join("rst/missing.rst");
        assert!(matches!(
            migrator.convert_rst(&Context::default(), &missing),
            Err(ConvertError::MissingInput(_))
        ));

        let txt = dir.path().join("rst/notes.txt");
        write(&txt, "Text\n");
        assert!(matches!(
            migrator.convert_rst(&Context::default(), &txt),
            Err(ConvertError::Extension { expected: "rst", .. })
        ));
    }

    #[test]
    fn test_convert_rst_malformed_output() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let rst = dir.path().join("rst/page.rst");
        write(&rst, "Text\n");

        let converter = CopyConverter {
            output: Some("::: note\nTitle\n"),
            ..CopyConverter::default()
        };
        let migrator = Migrator::new(&project, &converter);
        let result = migrator.convert_rst(&Context::default(), &rst);
        assert!(matches!(result, Err(ConvertError::Fence { .. })));
        assert!(!dir.path().join("docs/page.md").exists());
    }

    #[test]
    fn test_convert_markdown_into_upload() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let md = dir.path().join("docs/styling/index.md");
        write(&md, "!!! note\n\n    Remember.\n");

        let converter = CopyConverter::default();
        let migrator = Migrator::new(&project, &converter);
        let html = migrator.convert_markdown(&md).unwrap();

        assert_eq!(html, dir.path().join("target/upload/styling/index.html"));
        assert_eq!(
            fs::read_to_string(dir.path().join("target/upload/styling/index.prep.md")).unwrap(),
            "::: note\n\nRemember.\n:::\n\n"
        );
    }

    #[test]
    fn test_convert_html_beside_input() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let html = dir.path().join("target/download/index.fr.html");
        write(&html, "``` #text\nls\n```\n");

        let converter = CopyConverter::default();
        let migrator = Migrator::new(&project, &converter);
        let md = migrator.convert_html(&html).unwrap();

        assert_eq!(md, dir.path().join("target/download/index.fr.md"));
        assert_eq!(fs::read_to_string(&md).unwrap(), "```\nls\n```\n");
    }

    #[test]
    fn test_protect_and_translated_path() {
        let dir = TempDir::new().unwrap();
        let project = project(dir.path());
        let html = dir.path().join("target/upload/a/index.html");
        write(&html, "<code>x</code>");

        let converter = CopyConverter::default();
        let migrator = Migrator::new(&project, &converter);
        let upload = migrator.protect_for_translation(&html).unwrap();

        assert_eq!(upload, dir.path().join("target/upload/a/index.tmp.html"));
        assert_eq!(
            fs::read_to_string(&upload).unwrap(),
            "<code><![CDATA[x]]></code>"
        );
        assert_eq!(
            migrator.translated_path(&html, "FR"),
            dir.path().join("target/download/a/index.fr.html")
        );
    }
}
