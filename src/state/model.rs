/// Mutually exclusive editing modes. Each non-`None` mode owns transient
/// state (crop region, mask layer or overlay objects) that lives until the
/// mode is applied or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    None,
    Crop,
    Erase,
    Inpaint,
    Objects,
}

impl EditMode {
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Erase and inpaint both paint a mask layer.
    pub const fn uses_mask(self) -> bool {
        matches!(self, Self::Erase | Self::Inpaint)
    }
}
