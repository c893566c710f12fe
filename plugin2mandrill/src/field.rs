//! Field classification and the Mandrill output vocabulary.

/// Closed classification of Assembly field types.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Fallback for tokens outside the known vocabulary.
    Undefined,
    Real,
    ByteInt,
    ShortInt,
    LongInt,
    ByteFlags,
    WordFlags,
    LongFlags,
    CharEnum,
    Enum,
    LongEnum,
    Block,
    Color,
    TagRef,
    DataRef,
    String,
    StringId,
    Comment,
    Angle,
    Rect,
    // these two don't have any representation on the Mandrill side; the
    // values end up just being string literals
    Option,
    Bit,
}

/// Assembly type tokens and their classifications.
pub const KNOWN_TYPES: &[(&str, FieldKind)] = &[
    ("float32", FieldKind::Real),
    ("int8", FieldKind::ByteInt),
    ("uint8", FieldKind::ByteInt),
    ("int16", FieldKind::ShortInt),
    ("uint16", FieldKind::ShortInt),
    ("int32", FieldKind::LongInt),
    ("uint32", FieldKind::LongInt),
    ("flags8", FieldKind::ByteFlags),
    ("flags16", FieldKind::WordFlags),
    ("flags32", FieldKind::LongFlags),
    ("enum8", FieldKind::CharEnum),
    ("enum16", FieldKind::Enum),
    ("enum32", FieldKind::LongEnum),
    ("tagblock", FieldKind::Block),
    ("colorf", FieldKind::Color),
    ("tagref", FieldKind::TagRef),
    ("dataref", FieldKind::DataRef),
    ("ascii", FieldKind::String),
    ("stringid", FieldKind::StringId),
    ("comment", FieldKind::Comment),
    ("option", FieldKind::Option),
    ("bit", FieldKind::Bit),
    ("degree", FieldKind::Angle),
    ("rect16", FieldKind::Rect),
];

impl FieldKind {
    /// Classify an Assembly type token.
    ///
    /// Case-insensitive and total: tokens outside the known vocabulary
    /// classify as [`FieldKind::Undefined`], never an error.
    pub fn classify(token: &str) -> FieldKind {
        let token = token.to_ascii_lowercase();
        KNOWN_TYPES
            .iter()
            .find(|&&(name, _)| name == token)
            .map_or(FieldKind::Undefined, |&(_, kind)| kind)
    }

    /// The Mandrill field type token for this classification.
    ///
    /// [`FieldKind::Bit`] and [`FieldKind::Option`] never reach this in
    /// rendering: they surface as bare string literals.
    pub fn mandrill_token(self) -> &'static str {
        match self {
            FieldKind::Real => "_field_real",
            FieldKind::ByteInt => "_field_byte_integer",
            FieldKind::ShortInt => "_field_short_integer",
            FieldKind::LongInt => "_field_long_integer",
            FieldKind::ByteFlags => "_field_byte_flags",
            FieldKind::WordFlags => "_field_word_flags",
            FieldKind::LongFlags => "_field_long_flags",
            FieldKind::CharEnum => "_field_char_enum",
            FieldKind::Enum => "_field_enum",
            FieldKind::LongEnum => "_field_long_enum",
            FieldKind::Block => "_field_block",
            FieldKind::Color => "_field_real_argb_color",
            FieldKind::TagRef => "_field_tag_reference",
            FieldKind::DataRef => "_field_data",
            FieldKind::String => "_field_string",
            FieldKind::StringId => "_field_string_id",
            FieldKind::Comment => "_field_explanation",
            FieldKind::Angle => "_field_angle",
            FieldKind::Rect => "_field_rectangle_2d",
            FieldKind::Undefined | FieldKind::Option | FieldKind::Bit => "undefined_fixme",
        }
    }

    /// A container-shaped classification declares nested content of its own:
    /// a tag block holds fields, an enum or flag set holds literals.
    pub fn is_container(self) -> bool {
        self == FieldKind::Block || self.is_enum_or_flags()
    }

    pub fn is_enum_or_flags(self) -> bool {
        matches!(
            self,
            FieldKind::ByteFlags
                | FieldKind::WordFlags
                | FieldKind::LongFlags
                | FieldKind::CharEnum
                | FieldKind::Enum
                | FieldKind::LongEnum
        )
    }
}

/// The closest known type token within edit distance 2 of `token`, for
/// "did you mean" notes on unknown-type diagnostics.
pub fn closest_known_type(token: &str) -> Option<&'static str> {
    let token = token.to_ascii_lowercase();
    let mut closest: Option<(&'static str, usize)> = None;
    for &(name, _) in KNOWN_TYPES {
        let distance = levenshtein::levenshtein(&token, name);
        if distance <= 2 && closest.map_or(true, |(_, best)| distance < best) {
            closest = Some((name, distance));
        }
    }
    closest.map(|(name, _)| name)
}
