//! Domain-level command types.
//! The REST layer maps the public DTOs from the `shared` crate onto these
//! before calling into the domain.

pub mod students {
    use shared::Course;

    /// Why a new student was refused before reaching the repository
    #[derive(Debug, PartialEq, Eq, thiserror::Error)]
    pub enum StudentValidationError {
        #[error("Name cannot be empty")]
        EmptyName,
        #[error("Division cannot be empty")]
        EmptyDivision,
        #[error("DNI cannot be empty")]
        EmptyDni,
        #[error("Unknown course {0}")]
        UnknownCourse(String),
    }

    /// Input for enrolling a new student
    #[derive(Debug, Clone)]
    pub struct AddStudentCommand {
        pub name: String,
        pub course: u32,
        pub division: String,
        pub dni: String,
    }

    impl AddStudentCommand {
        /// Trims every text field, rejects the ones left empty and any
        /// year/division outside the school's courses
        pub fn validated(self) -> Result<Self, StudentValidationError> {
            let name = self.name.trim().to_string();
            let division = self.division.trim().to_string();
            let dni = self.dni.trim().to_string();

            if name.is_empty() {
                return Err(StudentValidationError::EmptyName);
            }
            if division.is_empty() {
                return Err(StudentValidationError::EmptyDivision);
            }
            if dni.is_empty() {
                return Err(StudentValidationError::EmptyDni);
            }
            let course = Course::new(self.course, division.as_str());
            if !course.is_known() {
                return Err(StudentValidationError::UnknownCourse(course.key()));
            }

            Ok(Self {
                name,
                course: self.course,
                division,
                dni,
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn command(name: &str, division: &str, dni: &str) -> AddStudentCommand {
            AddStudentCommand {
                name: name.to_string(),
                course: 3,
                division: division.to_string(),
                dni: dni.to_string(),
            }
        }

        #[test]
        fn test_validated_trims_fields() {
            let cmd = command("  Ana ", " II", "12345678 ").validated().unwrap();
            assert_eq!(cmd.name, "Ana");
            assert_eq!(cmd.division, "II");
            assert_eq!(cmd.dni, "12345678");
        }

        #[test]
        fn test_validated_rejects_blank_fields() {
            assert_eq!(
                command(" ", "II", "1").validated().unwrap_err(),
                StudentValidationError::EmptyName
            );
            assert_eq!(
                command("Ana", "", "1").validated().unwrap_err(),
                StudentValidationError::EmptyDivision
            );
            assert_eq!(
                command("Ana", "II", "\t").validated().unwrap_err(),
                StudentValidationError::EmptyDni
            );
        }

        #[test]
        fn test_validated_rejects_unknown_course() {
            let mut cmd = command("Ana", "II", "1");
            cmd.course = 7;
            assert_eq!(
                cmd.validated().unwrap_err(),
                StudentValidationError::UnknownCourse("7-II".to_string())
            );
            assert_eq!(
                command("Ana", "IV", "1").validated().unwrap_err(),
                StudentValidationError::UnknownCourse("3-IV".to_string())
            );
        }
    }
}
