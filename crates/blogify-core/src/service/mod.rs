//! Application services - the operations behind the HTTP surface.

mod accounts;
mod content;

pub use accounts::{AccountService, LoginOutcome, RenameOutcome};
pub use content::{
    AuthorRef, CommentView, CommenterRef, ContentService, NewPost, PostChanges, PostFeed, PostView,
};
