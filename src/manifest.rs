//! Support for emitting the machine-readable article index
//! (`articles.json`) from a list of articles. The site's client-side
//! loader fetches this document to discover article pages, so dates are
//! validated here rather than shipping an index the client chokes on.

use crate::article::Article;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// One entry of the article index.
#[derive(Serialize)]
struct Entry<'a> {
    title: &'a str,
    date: &'a str,
    category: Option<&'a str>,
    url: String,
}

/// Serializes the article index for a list of [`Article`]s and writes
/// the result to a [`std::io::Write`].
pub fn write_manifest<W: Write>(articles: &[&Article], w: W) -> Result<()> {
    serde_json::to_writer_pretty(w, &entries(articles)?)?;
    Ok(())
}

fn entries<'a>(articles: &[&'a Article]) -> Result<Vec<Entry<'a>>> {
    let mut entries = Vec::with_capacity(articles.len());
    for article in articles {
        NaiveDate::parse_from_str(&article.date, "%Y-%m-%d")?;
        entries.push(Entry {
            title: &article.title,
            date: &article.date,
            category: article.category.as_ref().map(|c| c.name.as_str()),
            url: article.url.to_string(),
        });
    }
    Ok(entries)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem emitting the article index. Variants include
/// I/O, serialization, and date parsing issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when serializing the index fails.
    Json(serde_json::Error),

    /// Returned when there is an issue parsing an article's date.
    DateTimeParse(chrono::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Json(err) => err.fmt(f),
            Error::DateTimeParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::DateTimeParse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to
    /// use the `?` operator in fallible manifest operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts [`serde_json::Error`]s into [`Error`]. This allows us to
    /// use the `?` operator in fallible manifest operations.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<chrono::ParseError> for Error {
    /// Converts [`chrono::ParseError`]s into [`Error`]. This allows us
    /// to use the `?` operator in fallible manifest operations.
    fn from(err: chrono::ParseError) -> Error {
        Error::DateTimeParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::article::Parser;
    use std::path::Path;
    use url::Url;

    fn article(id: &str, date: &str, category: &str) -> Article {
        let base = Url::parse("https://example.org/articles/").unwrap();
        Parser::new(&base, Path::new("/tmp/out/articles"))
            .article_from_str(
                id,
                &format!(
                    r#"{{ "title": "{}", "date": "{}", "category": "{}",
                          "content": [{{ "p": ["body"] }}] }}"#,
                    id, date, category,
                ),
            )
            .unwrap()
    }

    #[test]
    fn test_manifest_round_trips() -> Result<()> {
        let a = article("first", "2021-04-16", "General");
        let b = article("second", "2020-11-02", "");
        let mut buffer: Vec<u8> = Vec::new();

        write_manifest(&[&a, &b], &mut buffer)?;

        let value: serde_json::Value =
            serde_json::from_slice(&buffer).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["title"], "first");
        assert_eq!(entries[0]["category"], "General");
        assert_eq!(
            entries[0]["url"],
            "https://example.org/articles/first.html"
        );
        assert_eq!(entries[1]["category"], serde_json::Value::Null);
        Ok(())
    }

    #[test]
    fn test_manifest_rejects_malformed_date() {
        let a = article("bad", "April 16th", "General");
        let mut buffer: Vec<u8> = Vec::new();

        match write_manifest(&[&a], &mut buffer) {
            Err(Error::DateTimeParse(_)) => {}
            other => panic!("expected a date parse error, got {:?}", other),
        }
    }
}
