//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output static site: parsing the
//! articles ([`crate::article`]), rendering article, listing, and
//! archive pages ([`crate::write`]), copying the static asset
//! directories into the output tree, and emitting the machine-readable
//! article index ([`crate::manifest`]).

use crate::article::{Article, Error as ParseError, Parser as ArticleParser};
use crate::config::Config;
use crate::manifest::{self, Error as ManifestError};
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use log::info;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Builds the site from a [`Config`] object. This calls into
/// [`ArticleParser::parse_articles`], [`Writer::write_articles`], and
/// [`manifest::write_manifest`] which do the heavy-lifting. This
/// function also copies the static asset directories from the working
/// directory into the output directory.
pub fn build_site(config: &Config) -> Result<()> {
    let parser = ArticleParser::new(
        &config.articles_url,
        &config.articles_output_directory,
    );

    // collect all articles, most recent first
    let articles = parser.parse_articles(&config.articles_source_directory)?;
    info!("Parsed {} articles", articles.len());

    // ignored articles still get pages but stay out of the listing,
    // archive, and index
    let listed: Vec<&Article> = articles
        .iter()
        .filter(|article| !config.ignore.contains(&article.id))
        .collect();

    // Parse the template files.
    let article_template = parse_template(config.article_template.iter())?;
    let index_template = parse_template(config.index_template.iter())?;
    let archive_template = parse_template(config.archive_template.iter())?;

    // Blow away the old output directories so we don't have any
    // collisions. We probably don't want to naively delete the whole
    // root output directory in case the user accidentally passes the
    // wrong directory.
    rmdir(&config.articles_output_directory)?;
    rmdir(&config.index_output_directory)?;
    for dir in &config.static_source_directories {
        if let Some(name) = dir.file_name() {
            rmdir(&config.root_output_directory.join(name))?;
        }
    }
    std::fs::create_dir_all(&config.root_output_directory)?;

    // write the article, listing, and archive pages
    let writer = Writer {
        article_template: &article_template,
        index_template: &index_template,
        archive_template: &archive_template,
        index_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        index_page_size: config.index_page_size,
        root_output_directory: &config.root_output_directory,
        title: &config.title,
        home_page: &config.home_page,
        static_url: &config.static_url,
    };
    writer.write_articles(&articles, &listed)?;

    // copy the static asset directories
    for dir in &config.static_source_directories {
        if let Some(name) = dir.file_name() {
            copy_dir(dir, &config.root_output_directory.join(name))?;
        }
    }

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // emit the article index
    manifest::write_manifest(
        &listed,
        File::create(config.root_output_directory.join("articles.json"))?,
    )?;
    info!(
        "Wrote {} listed articles to {}",
        listed.len(),
        config.root_output_directory.display(),
    );

    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix can't fail since every entry is under `src`
        let target = dst.join(entry.path().strip_prefix(src).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// Loads the template file contents, concatenates them, and parses the
// result into a template.
fn parse_template<P: AsRef<Path>>(
    template_files: impl Iterator<Item = P>,
) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// writing, cleaning output directories, parsing template files, and
/// other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors writing [`Article`]s to disk as HTML files.
    Write(WriteError),

    /// Returned for errors emitting the article index.
    Manifest(ManifestError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for I/O problems while walking static asset directories.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Manifest(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Manifest(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to
    /// use the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<ManifestError> for Error {
    /// Converts [`ManifestError`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: ManifestError) -> Error {
        Error::Manifest(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to
    /// use the `?` operator while copying asset directories.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    const ARTICLE: &str = r#"{
        "image": "hello.jpg",
        "title": "Hello, world!",
        "date": "2021-04-16",
        "category": "General",
        "content": [
            { "p": ["First paragraph."] },
            { "p": ["See ", { "a": ["https://example.org/x", "here"] }, "."] },
            { "code": ["fn main() {}"] }
        ]
    }"#;

    const IGNORED: &str = r#"{
        "title": "About",
        "date": "2020-01-01",
        "content": [{ "p": ["About this site."] }]
    }"#;

    fn scaffold(dir: &Path) -> std::io::Result<()> {
        std::fs::write(
            dir.join("site.yaml"),
            "site_root: https://example.org/\ntitle: Example Blog\n",
        )?;
        std::fs::create_dir(dir.join("theme"))?;
        std::fs::write(
            dir.join("theme/theme.yaml"),
            "article_template: [article.html]\n\
             index_template: [index.html]\n\
             archive_template: [archive.html]\n",
        )?;
        std::fs::write(dir.join("theme/article.html"), "{{.item.body}}")?;
        std::fs::write(
            dir.join("theme/index.html"),
            "{{range .item}}{{.summary}}{{end}}",
        )?;
        std::fs::write(
            dir.join("theme/archive.html"),
            "{{range .item}}{{.year}}{{end}}",
        )?;
        std::fs::create_dir(dir.join("articles"))?;
        std::fs::write(dir.join("articles/hello.json"), ARTICLE)?;
        std::fs::write(dir.join("articles/about.json"), IGNORED)?;
        std::fs::create_dir(dir.join("css"))?;
        std::fs::write(dir.join("css/index.css"), "body {}")?;
        std::fs::create_dir(dir.join("img"))?;
        std::fs::write(dir.join("img/hello.jpg"), "not really a jpeg")?;
        std::fs::write(dir.join("ignore.txt"), "about\n")?;
        Ok(())
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let working = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        scaffold(working.path())?;

        let config =
            Config::from_directory(working.path(), output.path()).unwrap();
        config.validate().unwrap();
        build_site(&config)?;

        let article = std::fs::read_to_string(
            output.path().join("articles/hello.html"),
        )?;
        assert!(article.contains("<p>First paragraph.</p>"));
        assert!(article
            .contains("<a href=\"https://example.org/x\">here</a>"));

        // the ignored article still gets a page
        assert!(output.path().join("articles/about.html").exists());

        // but stays out of the listing and the index
        let listing =
            std::fs::read_to_string(output.path().join("index.html"))?;
        assert!(listing.contains("First paragraph."));
        assert!(!listing.contains("About this site."));

        let archive =
            std::fs::read_to_string(output.path().join("archive.html"))?;
        assert_eq!(archive.trim(), "2021");

        let manifest = std::fs::read_to_string(
            output.path().join("articles.json"),
        )?;
        let index: serde_json::Value =
            serde_json::from_str(&manifest).unwrap();
        assert_eq!(index.as_array().unwrap().len(), 1);

        // static assets came along
        assert!(output.path().join("css/index.css").exists());
        assert!(output.path().join("img/hello.jpg").exists());
        Ok(())
    }
}
