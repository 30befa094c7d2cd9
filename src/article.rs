//! Defines the [`Article`], [`Parser`], and [`Error`] types, and the
//! logic for parsing article source documents into rendered articles.
//! See [`Article::to_value`] and [`Article::summarize`] for details on
//! how articles are converted into template values.

use std::{
    fmt,
    fs::{read_dir, File},
    io::Read,
    path::{Path, PathBuf},
};

use log::warn;
use serde::Deserialize;
use url::Url;

use crate::{category::Category, content, htmlrenderer};

/// The source document for one article. `content` stays a raw JSON value
/// until the block renderer flattens it.
#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    image: String,

    #[serde(default)]
    title: String,

    #[serde(default)]
    date: String,

    #[serde(default)]
    category: String,

    #[serde(default)]
    content: serde_json::Value,
}

/// A fully parsed article: metadata plus the rendered HTML body.
#[derive(Clone, Debug)]
pub struct Article {
    /// The source file name less its extension; doubles as the output
    /// file stem.
    pub id: String,

    pub title: String,

    /// The publication date as written in the source (`YYYY-MM-DD`).
    /// Kept as a string so sorting matches the source text; the archive
    /// and manifest parse it properly.
    pub date: String,

    /// Cover image file name, relative to the site's `img/` directory.
    /// Empty when the article has none.
    pub image: String,

    pub category: Option<Category>,

    /// The rendered HTML fragment for the article's content blocks.
    pub body: String,

    /// The public URL of the article page.
    pub url: Url,

    /// The output location of the article page.
    pub file_path: PathBuf,
}

impl Article {
    /// Returns the listing summary: everything up to and including the
    /// body's first closing paragraph tag, and whether anything was cut.
    pub fn summary(&self) -> (&str, bool) {
        const PARAGRAPH_END: &str = "</p>";
        match self.body.find(PARAGRAPH_END) {
            Some(i) => {
                let stop = i + PARAGRAPH_END.len();
                (&self.body[..stop], stop < self.body.len())
            }
            None => (&self.body, false),
        }
    }

    /// Converts an [`Article`] into a [`gtmpl::Value`] for the article
    /// page template. Empty metadata fields become [`gtmpl::Value::Nil`]
    /// so templates insert nothing for them.
    pub fn to_value(&self) -> gtmpl::Value {
        let mut m = self.metadata_value();
        m.insert("body".to_owned(), gtmpl::Value::String(self.body.clone()));
        gtmpl::Value::Object(m)
    }

    /// Like [`Article::to_value`], but carries the truncated listing
    /// summary instead of the full body, plus a `summarized` flag the
    /// index template can use to mark articles that were cut.
    pub fn summarize(&self) -> gtmpl::Value {
        let (summary, summarized) = self.summary();
        let mut m = self.metadata_value();
        m.insert("summary".to_owned(), gtmpl::Value::String(summary.to_owned()));
        m.insert("summarized".to_owned(), gtmpl::Value::Bool(summarized));
        gtmpl::Value::Object(m)
    }

    fn metadata_value(
        &self,
    ) -> std::collections::HashMap<String, gtmpl::Value> {
        use std::collections::HashMap;
        let mut m: HashMap<String, gtmpl::Value> = HashMap::new();
        m.insert("id".to_owned(), gtmpl::Value::String(self.id.clone()));
        m.insert("title".to_owned(), string_or_nil(&self.title));
        m.insert("date".to_owned(), string_or_nil(&self.date));
        m.insert("image".to_owned(), string_or_nil(&self.image));
        m.insert(
            "category".to_owned(),
            match &self.category {
                Some(category) => category.into(),
                None => gtmpl::Value::Nil,
            },
        );
        m.insert(
            "url".to_owned(),
            gtmpl::Value::String(self.url.to_string()),
        );
        m
    }
}

fn string_or_nil(s: &str) -> gtmpl::Value {
    match s.is_empty() {
        true => gtmpl::Value::Nil,
        false => gtmpl::Value::String(s.to_owned()),
    }
}

/// Parses [`Article`] objects from source files.
pub struct Parser<'a> {
    /// `articles_url` is the base URL for article pages (i.e., the URL
    /// for an article is `{articles_url}/{article_id}.html`).
    articles_url: &'a Url,

    /// `articles_directory` is the directory in which article pages will
    /// be rendered.
    articles_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(
        articles_url: &'a Url,
        articles_directory: &'a Path,
    ) -> Parser<'a> {
        Parser {
            articles_url,
            articles_directory,
        }
    }

    /// Searches `source_directory` for article files (extension =
    /// `.json`) and returns a list of [`Article`] objects sorted by date
    /// (most recent first). Each file must hold a single JSON document:
    ///
    /// ```json
    /// {
    ///     "image": "hello.jpg",
    ///     "title": "Hello, world!",
    ///     "date": "2021-04-16",
    ///     "category": "General",
    ///     "content": [{ "p": ["Hello."] }]
    /// }
    /// ```
    pub fn parse_articles(&self, source_directory: &Path) -> Result<Vec<Article>> {
        const ARTICLE_EXTENSION: &str = ".json";

        let mut articles = Vec::new();
        for result in read_dir(source_directory)? {
            let entry = result?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if file_name.ends_with(ARTICLE_EXTENSION) {
                let id = file_name.trim_end_matches(ARTICLE_EXTENSION);
                articles.push(self.parse_article(id, &entry.path())?);
            }
        }

        articles.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(articles)
    }

    fn parse_article(&self, id: &str, path: &Path) -> Result<Article> {
        match self._parse_article(id, path) {
            Ok(article) => Ok(article),
            Err(e) => Err(Error::Annotated(
                format!("parsing article `{}`", id),
                Box::new(e),
            )),
        }
    }

    fn _parse_article(&self, id: &str, path: &Path) -> Result<Article> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        self.article_from_str(id, &contents)
    }

    /// Parses and renders a single [`Article`] from `id` and `input`
    /// strings. Malformed content shapes inside the document don't fail
    /// the article; they are logged and the offending runs skipped.
    pub fn article_from_str(&self, id: &str, input: &str) -> Result<Article> {
        let document: Document = serde_json::from_str(input)?;
        let file_name = format!("{}.html", id);

        let runs = content::linearize(&document.content);
        for warning in &runs.warnings {
            warn!("article `{}`: {}", id, warning);
        }
        let mut body = String::new();
        for warning in htmlrenderer::push_html(&mut body, &runs)? {
            warn!("article `{}`: {}", id, warning);
        }

        Ok(Article {
            id: id.to_owned(),
            title: document.title,
            date: document.date,
            image: document.image,
            category: match document.category.is_empty() {
                true => None,
                false => Some(Category::new(&document.category)),
            },
            body,
            url: self.articles_url.join(&file_name)?,
            file_path: self.articles_directory.join(&file_name),
        })
    }
}

/// Represents the result of an [`Article`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing an [`Article`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when there was an error parsing the document as JSON.
    DeserializeJson(serde_json::Error),

    /// Returned when there is a problem building article URLs.
    UrlParse(url::ParseError),

    /// Returned when rendering the content blocks fails to format.
    Render(fmt::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DeserializeJson(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeJson(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us
    /// to use the `?` operator for deserialization functions.
    fn from(err: serde_json::Error) -> Error {
        Error::DeserializeJson(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to
    /// use the `?` operator for URL joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<fmt::Error> for Error {
    /// Converts a [`fmt::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator around the HTML renderer.
    fn from(err: fmt::Error) -> Error {
        Error::Render(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SIMPLE: &str = r#"{
        "image": "hello.jpg",
        "title": "Hello, world!",
        "date": "2021-04-16",
        "category": "General",
        "content": [
            { "p": ["First paragraph."] },
            { "p": ["Second paragraph."] }
        ]
    }"#;

    fn parser(url: &Url) -> Parser {
        Parser::new(url, Path::new("/tmp/out/articles"))
    }

    #[test]
    fn test_article_from_str() -> Result<()> {
        let base = Url::parse("https://example.org/articles/").unwrap();
        let article = parser(&base).article_from_str("hello", SIMPLE)?;

        assert_eq!(article.id, "hello");
        assert_eq!(article.title, "Hello, world!");
        assert_eq!(article.date, "2021-04-16");
        assert_eq!(article.category, Some(Category::new("General")));
        assert_eq!(
            article.body,
            "<p>First paragraph.</p><p>Second paragraph.</p>",
        );
        assert_eq!(
            article.url.as_str(),
            "https://example.org/articles/hello.html",
        );
        Ok(())
    }

    #[test]
    fn test_summary_stops_at_first_paragraph() -> Result<()> {
        let base = Url::parse("https://example.org/articles/").unwrap();
        let article = parser(&base).article_from_str("hello", SIMPLE)?;

        let (summary, summarized) = article.summary();
        assert_eq!(summary, "<p>First paragraph.</p>");
        assert!(summarized);
        Ok(())
    }

    #[test]
    fn test_summary_of_single_paragraph_is_whole_body() -> Result<()> {
        let base = Url::parse("https://example.org/articles/").unwrap();
        let article = parser(&base).article_from_str(
            "short",
            r#"{ "title": "Short", "date": "2021-01-01",
                 "content": [{ "p": ["Only."] }] }"#,
        )?;

        let (summary, summarized) = article.summary();
        assert_eq!(summary, article.body);
        assert!(!summarized);
        Ok(())
    }

    #[test]
    fn test_empty_fields_become_nil() -> Result<()> {
        let base = Url::parse("https://example.org/articles/").unwrap();
        let article = parser(&base).article_from_str(
            "undated",
            r#"{ "title": "Undated", "date": "",
                 "content": [{ "p": ["Hi."] }] }"#,
        )?;

        match article.to_value() {
            gtmpl::Value::Object(m) => {
                assert!(matches!(m.get("date"), Some(gtmpl::Value::Nil)));
                assert!(matches!(m.get("image"), Some(gtmpl::Value::Nil)));
                assert!(matches!(m.get("category"), Some(gtmpl::Value::Nil)));
                assert!(matches!(m.get("title"), Some(gtmpl::Value::String(_))));
            }
            other => panic!("expected an object value, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_parse_articles_sorts_most_recent_first() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("older.json"),
            r#"{ "title": "Older", "date": "2020-01-01",
                 "content": [{ "p": ["a"] }] }"#,
        )?;
        std::fs::write(
            dir.path().join("newer.json"),
            r#"{ "title": "Newer", "date": "2021-06-01",
                 "content": [{ "p": ["b"] }] }"#,
        )?;
        std::fs::write(dir.path().join("notes.txt"), "not an article")?;

        let base = Url::parse("https://example.org/articles/").unwrap();
        let articles = parser(&base).parse_articles(dir.path())?;

        let ids: Vec<&str> =
            articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
        Ok(())
    }
}
