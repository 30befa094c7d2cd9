//! Project configuration: the `site.yaml` project file, the theme's
//! template fragment lists, the ignore list, and the required-path
//! validation that runs before a build.

use anyhow::{anyhow, Result};
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

/// The `site.yaml` project file.
#[derive(Deserialize)]
struct Project {
    /// Base URL the site is served from; must end in a trailing slash
    /// for joins to behave.
    site_root: Url,

    title: String,

    #[serde(default)]
    index_page_size: PageSize,
}

/// The `theme/theme.yaml` file. Each template is a list of fragment
/// files concatenated in order before parsing.
#[derive(Deserialize)]
struct Theme {
    article_template: Vec<PathBuf>,
    index_template: Vec<PathBuf>,
    archive_template: Vec<PathBuf>,
}

pub struct Config {
    pub title: String,
    pub home_page: Url,

    pub articles_source_directory: PathBuf,
    pub articles_url: Url,
    pub articles_output_directory: PathBuf,

    pub index_url: Url,
    pub index_output_directory: PathBuf,
    pub index_page_size: usize,

    pub article_template: Vec<PathBuf>,
    pub index_template: Vec<PathBuf>,
    pub archive_template: Vec<PathBuf>,

    /// The asset directories copied verbatim into the output root.
    pub static_source_directories: Vec<PathBuf>,
    pub static_url: Url,

    pub root_output_directory: PathBuf,

    /// Article ids excluded from the listing, archive, and manifest.
    pub ignore: HashSet<String>,
}

impl Config {
    /// Looks for `site.yaml` in `dir` or the nearest ancestor directory
    /// that has one.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join("site.yaml");
        if path.exists() {
            match Config::from_project_file(&path, output_directory) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `site.yaml` in any parent directory"
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        let theme_dir = project_root.join("theme");
        let theme_file = open(&theme_dir.join("theme.yaml"), "theme")?;
        let theme: Theme = serde_yaml::from_reader(theme_file)?;

        let resolve = |relpaths: &[PathBuf]| -> Vec<PathBuf> {
            relpaths.iter().map(|relpath| theme_dir.join(relpath)).collect()
        };

        Ok(Config {
            title: project.title,
            home_page: project.site_root.clone(),
            articles_source_directory: project_root.join("articles"),
            articles_url: project.site_root.join("articles/")?,
            articles_output_directory: output_directory.join("articles"),
            index_url: project.site_root.join("pages/")?,
            index_output_directory: output_directory.join("pages"),
            index_page_size: project.index_page_size.0,
            article_template: resolve(&theme.article_template),
            index_template: resolve(&theme.index_template),
            archive_template: resolve(&theme.archive_template),
            static_source_directories: vec![
                project_root.join("css"),
                project_root.join("img"),
            ],
            static_url: project.site_root.clone(),
            root_output_directory: output_directory.to_owned(),
            ignore: read_ignore(&project_root.join("ignore.txt"))?,
        })
    }

    /// Checks that every directory and file the build needs actually
    /// exists, reporting each found path. The first missing path is
    /// fatal for the whole run.
    pub fn validate(&self) -> Result<()> {
        let mut required: Vec<&Path> =
            vec![&self.articles_source_directory];
        required.extend(
            self.static_source_directories.iter().map(PathBuf::as_path),
        );
        required.extend(self.article_template.iter().map(PathBuf::as_path));
        required.extend(self.index_template.iter().map(PathBuf::as_path));
        required.extend(self.archive_template.iter().map(PathBuf::as_path));

        for path in required {
            if path.exists() {
                info!("Found {}", path.display());
            } else {
                return Err(anyhow!("Unable to find {}", path.display()));
            }
        }
        Ok(())
    }
}

/// The ignore file is one article id per line; blank lines don't count.
fn read_ignore(path: &Path) -> Result<HashSet<String>> {
    let mut contents = String::new();
    open(path, "ignore")?.read_to_string(&mut contents)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!(
            "Opening {} file `{}`: {}",
            kind,
            path.display(),
            e
        )),
        Ok(file) => Ok(file),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PROJECT: &str = "site_root: https://example.org/\n\
                           title: Example Blog\n\
                           index_page_size: 2\n";

    const THEME: &str = "article_template: [base.html, article.html]\n\
                         index_template: [base.html, index.html]\n\
                         archive_template: [base.html, archive.html]\n";

    fn scaffold(dir: &Path) -> std::io::Result<()> {
        std::fs::write(dir.join("site.yaml"), PROJECT)?;
        std::fs::create_dir(dir.join("theme"))?;
        std::fs::write(dir.join("theme/theme.yaml"), THEME)?;
        for fragment in ["base.html", "article.html", "index.html", "archive.html"] {
            std::fs::write(dir.join("theme").join(fragment), "")?;
        }
        std::fs::create_dir(dir.join("articles"))?;
        std::fs::create_dir(dir.join("css"))?;
        std::fs::create_dir(dir.join("img"))?;
        std::fs::write(dir.join("ignore.txt"), "drafts\n\nabout\n")?;
        Ok(())
    }

    #[test]
    fn test_from_directory_walks_up() -> Result<()> {
        let dir = tempfile::tempdir()?;
        scaffold(dir.path())?;
        let nested = dir.path().join("articles");

        let config = Config::from_directory(&nested, Path::new("/tmp/out"))?;
        assert_eq!(config.title, "Example Blog");
        assert_eq!(config.index_page_size, 2);
        assert_eq!(
            config.articles_url.as_str(),
            "https://example.org/articles/"
        );
        assert!(config.ignore.contains("drafts"));
        assert!(config.ignore.contains("about"));
        assert_eq!(config.ignore.len(), 2);
        Ok(())
    }

    #[test]
    fn test_validate_reports_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        scaffold(dir.path())?;
        let config =
            Config::from_directory(dir.path(), Path::new("/tmp/out"))?;
        std::fs::remove_dir(dir.path().join("img"))?;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unable to find"));
        Ok(())
    }

    #[test]
    fn test_validate_accepts_complete_working_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        scaffold(dir.path())?;
        let config =
            Config::from_directory(dir.path(), Path::new("/tmp/out"))?;
        config.validate()
    }
}
