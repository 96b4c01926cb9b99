//! SeaORM entity models
//!
//! Database entities for PaperScout

mod affiliation;
mod author;
mod paper;
mod paper_author;

pub use paper::{
    Entity as PaperEntity,
    Model as Paper,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
    ScoreState,
};

pub use author::{
    Entity as AuthorEntity,
    Model as Author,
    ActiveModel as AuthorActiveModel,
    Column as AuthorColumn,
};

pub use affiliation::{
    Entity as AffiliationEntity,
    Model as Affiliation,
    ActiveModel as AffiliationActiveModel,
    Column as AffiliationColumn,
};

pub use paper_author::{
    Entity as PaperAuthorEntity,
    Model as PaperAuthor,
    ActiveModel as PaperAuthorActiveModel,
    Column as PaperAuthorColumn,
};
