pub mod record;

pub use record::{
    expand_composite_subjects, split_out_of, MarksInfo, Record, SubjectMark,
    MATH_SCIENCE_SUBJECT, MATH_SCIENCE_TOTAL,
};
