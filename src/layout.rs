/// Which pseudo items are interleaved into the flat index space.
///
/// Supplied by the rendering layer. It can change at runtime via
/// [`crate::FlattenedAdapter::change_layout_info`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutInfo {
    pub has_global_header: bool,
    pub has_global_footer: bool,
    pub has_section_header: bool,
    pub has_section_footer: bool,
}

impl LayoutInfo {
    /// No headers or footers: the flat space is exactly the items.
    pub const fn new() -> Self {
        Self {
            has_global_header: false,
            has_global_footer: false,
            has_section_header: false,
            has_section_footer: false,
        }
    }

    /// Every pseudo item enabled.
    pub const fn all() -> Self {
        Self {
            has_global_header: true,
            has_global_footer: true,
            has_section_header: true,
            has_section_footer: true,
        }
    }

    pub const fn with_global_header(mut self, enabled: bool) -> Self {
        self.has_global_header = enabled;
        self
    }

    pub const fn with_global_footer(mut self, enabled: bool) -> Self {
        self.has_global_footer = enabled;
        self
    }

    pub const fn with_section_header(mut self, enabled: bool) -> Self {
        self.has_section_header = enabled;
        self
    }

    pub const fn with_section_footer(mut self, enabled: bool) -> Self {
        self.has_section_footer = enabled;
        self
    }

    pub(crate) const fn global_header_size(&self) -> usize {
        self.has_global_header as usize
    }

    pub(crate) const fn global_footer_size(&self) -> usize {
        self.has_global_footer as usize
    }

    pub(crate) const fn section_header_size(&self) -> usize {
        self.has_section_header as usize
    }

    /// Number of flat slots the global header and footer occupy together.
    pub const fn global_header_footer_size(&self) -> usize {
        self.has_global_header as usize + self.has_global_footer as usize
    }

    /// Number of flat slots each section's header and footer occupy together.
    pub const fn section_header_footer_size(&self) -> usize {
        self.has_section_header as usize + self.has_section_footer as usize
    }

    /// Returns `true` when switching from `self` to `next` moves some slot even if the total
    /// length stays the same.
    pub(crate) fn shifts_positions(&self, next: &Self, section_count: usize) -> bool {
        if self.has_global_header != next.has_global_header
            || self.has_global_footer != next.has_global_footer
        {
            return true;
        }
        section_count > 0
            && (self.has_section_header != next.has_section_header
                || self.has_section_footer != next.has_section_footer)
    }
}
