use crate::domain::key::Key;

pub const POST_KIND: &str = "Post";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub key: Key,
    pub name: String,
    pub body: String,
}

impl Post {
    pub fn id(&self) -> String {
        self.key.urlsafe()
    }

    /// Overwrites only the fields the patch carries a non-empty value for.
    pub fn apply(&mut self, patch: PostPatch) {
        if let Some(name) = patch.name.filter(|n| !n.is_empty()) {
            self.name = name;
        }
        if let Some(body) = patch.body.filter(|b| !b.is_empty()) {
            self.body = body;
        }
    }
}

/// A post that has not been stored yet and therefore has no key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub name: String,
    pub body: String,
}

impl NewPost {
    pub fn new(name: String, body: String) -> Self {
        Self { name, body }
    }
}

/// Partial update. `None` and `Some("")` both leave the field untouched;
/// a field cannot be cleared through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub name: Option<String>,
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post {
            key: Key::new(POST_KIND, 1),
            name: "Alice".into(),
            body: "Hello".into(),
        }
    }

    #[test]
    fn patch_overwrites_only_present_fields() {
        let mut post = sample();
        post.apply(PostPatch {
            name: Some("Bob".into()),
            body: None,
        });
        assert_eq!(post.name, "Bob");
        assert_eq!(post.body, "Hello");
    }

    #[test]
    fn empty_patch_field_means_no_change() {
        let mut post = sample();
        post.apply(PostPatch {
            name: Some(String::new()),
            body: Some(String::new()),
        });
        assert_eq!(post, sample());
    }
}
