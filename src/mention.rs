use std::collections::HashSet;

/// A post that references the monitored account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mention {
    /// Kept as a string; the API's numeric form overflows some JSON consumers.
    pub id: String,
    pub author: Author,
    pub text: String,
    pub place: Option<Place>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub country: String,
    pub name: String,
    pub full_name: String,
}

impl Mention {
    pub fn new(id: &str, author_id: u64, handle: &str, text: &str) -> Self {
        Mention {
            id: id.to_string(),
            author: Author {
                id: author_id,
                handle: handle.to_string(),
            },
            text: text.to_string(),
            place: None,
        }
    }

    pub fn with_place(mut self, country: &str, name: &str, full_name: &str) -> Self {
        self.place = Some(Place {
            country: country.to_string(),
            name: name.to_string(),
            full_name: full_name.to_string(),
        });
        self
    }

    /// `country name full_name`, separators kept even when fields are empty.
    /// A mention without a place yields two spaces.
    pub fn location(&self) -> String {
        match &self.place {
            Some(place) => format!("{} {} {}", place.country, place.name, place.full_name),
            None => "  ".to_string(),
        }
    }
}

/// Accounts exempt from classification: everyone the monitored account
/// follows, plus everyone following it. Rebuilt from scratch every run.
#[derive(Debug, Clone, Default)]
pub struct IdentitySet {
    friends: HashSet<u64>,
    followers: HashSet<u64>,
}

impl IdentitySet {
    pub fn new(
        friends: impl IntoIterator<Item = u64>,
        followers: impl IntoIterator<Item = u64>,
    ) -> Self {
        IdentitySet {
            friends: friends.into_iter().collect(),
            followers: followers.into_iter().collect(),
        }
    }

    pub fn is_exempt(&self, user_id: u64) -> bool {
        self.friends.contains(&user_id) || self.followers.contains(&user_id)
    }

    pub fn friend_count(&self) -> usize {
        self.friends.len()
    }

    pub fn follower_count(&self) -> usize {
        self.followers.len()
    }
}
