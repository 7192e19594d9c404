/// Role assignment determining which side of a mirrored pair accepts
/// writes. Only non-primary replicas are replicated to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromotionState {
    Primary,
    NonPrimary,
    Orphan,
    Unknown,
}

impl PromotionState {
    pub fn is_primary(self) -> bool {
        matches!(self, PromotionState::Primary)
    }
}
