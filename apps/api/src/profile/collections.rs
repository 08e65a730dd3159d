use serde_json::{Map, Value};

/// The JSON-encoded collections of one profile row, plus the row version
/// used for compare-and-set writes. `None` means the column is still NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCollections {
    pub version: i64,
    pub bookmarked_exams: Option<Vec<i64>>,
    pub shortlisted_colleges: Option<Vec<i64>>,
    pub exam_scores: Option<Map<String, Value>>,
}

/// Set-like id lists kept on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberCollection {
    Bookmarks,
    Shortlist,
}

impl MemberCollection {
    pub fn column(&self) -> &'static str {
        match self {
            MemberCollection::Bookmarks => "bookmarked_exams",
            MemberCollection::Shortlist => "shortlisted_colleges",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            MemberCollection::Bookmarks => "No bookmarked exams found",
            MemberCollection::Shortlist => "No shortlisted colleges found",
        }
    }

    pub fn read<'a>(&self, profile: &'a ProfileCollections) -> Option<&'a Vec<i64>> {
        match self {
            MemberCollection::Bookmarks => profile.bookmarked_exams.as_ref(),
            MemberCollection::Shortlist => profile.shortlisted_colleges.as_ref(),
        }
    }
}

/// A full replacement value for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Members(MemberCollection, Vec<i64>),
    ExamScores(Map<String, Value>),
}

impl FieldWrite {
    pub fn column(&self) -> &'static str {
        match self {
            FieldWrite::Members(collection, _) => collection.column(),
            FieldWrite::ExamScores(_) => "exam_scores",
        }
    }
}

/// Appends `item` unless present. Returns whether the list changed.
pub fn insert_member(members: &mut Vec<i64>, item: i64) -> bool {
    if members.contains(&item) {
        return false;
    }
    members.push(item);
    true
}

/// Drops `item` if present. Returns whether the list changed.
pub fn remove_member(members: &mut Vec<i64>, item: i64) -> bool {
    let before = members.len();
    members.retain(|m| *m != item);
    members.len() != before
}
