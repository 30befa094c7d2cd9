//! Responsible for templating and writing HTML pages to disk from
//! [`Article`] sources: one page per article, paginated listing pages of
//! article summaries, and the chronological archive page.

use crate::article::Article;
use chrono::{Datelike, NaiveDate};
use gtmpl::{Template, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Writes article, listing, and archive pages.
pub struct Writer<'a> {
    /// The template for article pages.
    pub article_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The template for the archive page.
    pub archive_template: &'a Template,

    /// The base URL for listing pages. The first page lives at
    /// `{index_url}index.html`, later ones at `{index_url}{n}.html`.
    pub index_url: &'a Url,

    /// The directory in which the listing HTML files will be written.
    pub index_output_directory: &'a Path,

    /// The number of article summaries per listing page.
    pub index_page_size: usize,

    /// The directory in which the archive page and other root-level
    /// output lands.
    pub root_output_directory: &'a Path,

    /// The site title, made available to every template.
    pub title: &'a str,

    /// The URL for the site's home page, typically the destination for
    /// the site-header link.
    pub home_page: &'a Url,

    /// The URL prefix for static assets, typically for the theme's
    /// stylesheet and article images.
    pub static_url: &'a Url,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "title".to_owned(),
                Value::String(self.title.to_owned()),
            );
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
        }
        let context = gtmpl::Context::from(value)?;
        page.template
            .execute(&mut std::fs::File::create(&page.file_path)?, &context)?;
        Ok(())
    }

    /// Takes the full article list plus the listed subset (ignored ids
    /// removed), assembles every output page, and writes them to disk.
    pub fn write_articles(
        &self,
        articles: &[Article],
        listed: &[&Article],
    ) -> Result<()> {
        use std::collections::HashSet;

        let mut pages = self.article_pages(articles);
        pages.extend(self.index_pages(listed));
        pages.push(self.archive_page(listed)?);

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        for page in &pages {
            let dir = page.file_path.parent().unwrap(); // there should always be a dir
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
            self.write_page(page)?;
        }
        Ok(())
    }

    /// Creates the article [`Page`]s. Articles arrive sorted most recent
    /// first, so `prev` points at the newer neighbor and `next` at the
    /// older one.
    fn article_pages<'t>(&'t self, articles: &[Article]) -> Vec<Page<'t>> {
        articles
            .iter()
            .enumerate()
            .map(|(i, article)| Page {
                item: article.to_value(),
                file_path: article.file_path.clone(),
                prev: match i < 1 {
                    true => None,
                    false => Some(articles[i - 1].url.clone()),
                },
                next: match i >= articles.len() - 1 {
                    true => None,
                    false => Some(articles[i + 1].url.clone()),
                },
                template: self.article_template,
            })
            .collect()
    }

    /// Creates the listing [`Page`]s: summaries chunked into pages of
    /// `index_page_size`, chained with prev/next URLs. An empty article
    /// list still produces an (empty) first page so the site root always
    /// has an index.
    fn index_pages<'t>(&'t self, listed: &[&Article]) -> Vec<Page<'t>> {
        if listed.is_empty() {
            return vec![Page {
                item: Value::Array(Vec::new()),
                file_path: self.index_output_directory.join("index.html"),
                prev: None,
                next: None,
                template: self.index_template,
            }];
        }

        let page_size = self.index_page_size.max(1);
        let total_pages = match listed.len() % page_size {
            0 => listed.len() / page_size,
            _ => listed.len() / page_size + 1,
        };

        listed
            .chunks(page_size)
            .enumerate()
            .map(|(i, chunk)| {
                let file_name = match i > 0 {
                    false => String::from("index.html"),
                    true => format!("{}.html", i),
                };

                Page {
                    item: Value::Array(
                        chunk.iter().map(|a| a.summarize()).collect(),
                    ),
                    file_path: self.index_output_directory.join(&file_name),
                    prev: match i {
                        0 => None,
                        // joining a bare file name onto a base URL that
                        // ends in a slash always succeeds
                        1 => Some(self.index_url.join("index.html").unwrap()),
                        _ => Some(
                            self.index_url
                                .join(&format!("{}.html", i - 1))
                                .unwrap(),
                        ),
                    },
                    next: match i < total_pages - 1 {
                        false => None,
                        true => Some(
                            self.index_url
                                .join(&format!("{}.html", i + 1))
                                .unwrap(),
                        ),
                    },
                    template: self.index_template,
                }
            })
            .collect()
    }

    /// Creates the archive [`Page`]: every listed article grouped by
    /// year, most recent group first.
    fn archive_page<'t>(&'t self, listed: &[&Article]) -> Result<Page<'t>> {
        use std::collections::HashMap;

        let groups = archive_groups(listed)?;
        Ok(Page {
            item: Value::Array(
                groups
                    .into_iter()
                    .map(|(year, articles)| {
                        let mut m: HashMap<String, Value> = HashMap::new();
                        m.insert(
                            "year".to_owned(),
                            Value::String(year.to_string()),
                        );
                        m.insert(
                            "articles".to_owned(),
                            Value::Array(
                                articles
                                    .iter()
                                    .map(|a| a.summarize())
                                    .collect(),
                            ),
                        );
                        Value::Object(m)
                    })
                    .collect(),
            ),
            file_path: self.root_output_directory.join("archive.html"),
            prev: None,
            next: None,
            template: self.archive_template,
        })
    }
}

/// Groups articles by publication year. The input is sorted most recent
/// first, so grouping consecutive years preserves that order.
fn archive_groups<'a>(
    articles: &[&'a Article],
) -> Result<Vec<(i32, Vec<&'a Article>)>> {
    let mut groups: Vec<(i32, Vec<&Article>)> = Vec::new();
    for &article in articles {
        let year =
            NaiveDate::parse_from_str(&article.date, "%Y-%m-%d")?.year();
        match groups.last_mut() {
            Some((current, group)) if *current == year => group.push(article),
            _ => groups.push((year, vec![article])),
        }
    }
    Ok(groups)
}

/// An object representing an output HTML file. A [`Page`] can be
/// converted to a [`Value`] and thus rendered in a template via
/// [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a
    /// [`Value::Object`] with fields `item`, `prev`, and `next` (see
    /// [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error parsing an article date while grouping the archive.
    DateTimeParse(chrono::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for fallible template
    /// operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<chrono::ParseError> for Error {
    /// Converts a [`chrono::ParseError`] into an [`Error`]. This allows
    /// us to use the `?` operator while grouping the archive.
    fn from(err: chrono::ParseError) -> Error {
        Error::DateTimeParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::DateTimeParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::DateTimeParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
