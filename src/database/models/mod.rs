pub mod label;
pub mod note;
pub mod user;

pub use label::{Label, LabelKind};
pub use note::{NewNote, Note, NoteChanges, NoteFilter, PopulatedNote};
pub use user::{NewUser, PublicUser, User};
