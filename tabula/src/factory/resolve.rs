use super::{Descent, Factory};
use crate::scratch::ScratchRegion;
use crate::{BuildError, FieldInfo};

impl Factory<'_> {
    /// Builds the value of one field and moves it into `scratch` at the field's offset.
    ///
    /// Errors come back unannotated; the structural builder adds the field position.
    pub(crate) fn resolve_field(
        &self,
        field: &FieldInfo,
        scratch: &mut ScratchRegion,
        descent: &mut Descent,
    ) -> Result<(), BuildError> {
        let value = self.classify_and_build(field.shape, descent)?;
        scratch.write_field(field, value)
    }
}
