//! Defines the [`Category`] type, which represents an
//! [`crate::article::Article`]'s category.

use gtmpl::Value;
use std::hash::{Hash, Hasher};

/// An article category. The `slug` is derived from the display name so
/// e.g. `Machine Learning` and `machine learning` resolve to the same
/// archive anchor and index value.
#[derive(Clone, Debug)]
pub struct Category {
    /// The category's display name, as written in the article source.
    pub name: String,

    /// The slugified name, safe to drop into URLs and element ids.
    pub slug: String,
}

impl Category {
    pub fn new(name: &str) -> Category {
        Category {
            name: name.to_owned(),
            slug: slug::slugify(name),
        }
    }
}

impl Hash for Category {
    /// Implements [`Hash`] for [`Category`] by delegating directly to
    /// the `slug` field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Category {
    /// Implements [`PartialEq`] and [`Eq`] for [`Category`] by
    /// delegating directly to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Category {}

impl From<&Category> for Value {
    /// Converts [`Category`]s into [`Value`]s for templating.
    fn from(c: &Category) -> Value {
        use std::collections::HashMap;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(c.name.clone()));
        m.insert("slug".to_owned(), Value::String(c.slug.clone()));
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slug_normalizes_case_and_spaces() {
        assert_eq!(Category::new("Machine Learning").slug, "machine-learning");
        assert_eq!(
            Category::new("Machine Learning"),
            Category::new("machine learning"),
        );
    }
}
