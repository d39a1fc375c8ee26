pub mod component_kind;
pub mod education_level;
pub mod field_type;
pub mod grading;
pub mod identifier;
pub mod letter;
pub mod role;

pub use component_kind::ComponentKind;
pub use education_level::EducationLevel;
pub use field_type::FieldDataType;
pub use grading::{ComponentScore, GradeBreakdown, GradingError, compute_final_grade};
pub use identifier::{IdentifierError, validate_column_name, validate_identifier};
pub use letter::{letter_for, validate_scale};
pub use role::Role;
