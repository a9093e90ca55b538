use super::conversation::RecommendationSlots;
use super::language::{Language, Localized};

pub struct Haircut {
    pub id: u32,
    pub name: Localized,
    pub images: &'static [&'static str],
    /// Canonical English values; `any` matches everything.
    pub hair_type: &'static str,
    pub face_shape: &'static str,
    pub style: &'static str,
}

pub const HAIRCUTS: &[Haircut] = &[
    Haircut {
        id: 1,
        name: Localized::new("Classic Fade", "Fade Klasik"),
        images: &["/images/classicfade/fade.jpg", "/images/classicfade/fade2.jpg"],
        hair_type: "straight",
        face_shape: "oval",
        style: "classic",
    },
    Haircut {
        id: 2,
        name: Localized::new("Modern Undercut", "Undercut Modern"),
        images: &["/images/undercut/undercut2.jpg", "/images/undercut/undercut3.jpg"],
        hair_type: "wavy",
        face_shape: "square",
        style: "modern",
    },
    Haircut {
        id: 3,
        name: Localized::new("Mullet", "Mullet"),
        images: &["/images/mullet/mullet2.jpg"],
        hair_type: "any",
        face_shape: "oval",
        style: "trendy",
    },
    Haircut {
        id: 4,
        name: Localized::new("Side Part", "Side Part"),
        images: &["/images/sidepart/sidepart.jpg"],
        hair_type: "straight",
        face_shape: "oval",
        style: "classic",
    },
    Haircut {
        id: 5,
        name: Localized::new("Curly Quiff", "Quiff Keriting"),
        images: &["/images/quiff/quiff.jpg"],
        hair_type: "curly",
        face_shape: "round",
        style: "modern",
    },
    Haircut {
        id: 6,
        name: Localized::new("Pompadour", "Pompadour"),
        images: &["/images/pompadour/pompadour.jpg"],
        hair_type: "any",
        face_shape: "square",
        style: "classic",
    },
    Haircut {
        id: 7,
        name: Localized::new("Buzz Cut", "Buzz Cut"),
        images: &["/images/buzzcut/buzzcut.jpg"],
        hair_type: "any",
        face_shape: "any",
        style: "minimalist",
    },
    Haircut {
        id: 8,
        name: Localized::new("French Crop", "French Crop"),
        images: &["/images/frenchcrop/frenchcrop.jpg"],
        hair_type: "any",
        face_shape: "oval",
        style: "trendy",
    },
    Haircut {
        id: 9,
        name: Localized::new("Two Block Haircut", "Potongan Two Block"),
        images: &["/images/twoblock/twoblock.jpg"],
        hair_type: "wavy",
        face_shape: "oval",
        style: "trendy",
    },
    Haircut {
        id: 10,
        name: Localized::new("Curtain Hairstyle", "Gaya Rambut Curtain"),
        images: &["/images/curtain/curtain.jpg"],
        hair_type: "straight",
        face_shape: "any",
        style: "trendy",
    },
    Haircut {
        id: 11,
        name: Localized::new("Comma Hair", "Rambut Koma"),
        images: &["/images/comma/comma.jpg"],
        hair_type: "straight",
        face_shape: "oval",
        style: "trendy",
    },
];

/// Case-insensitive lookup by name in either language.
pub fn find_by_name(name: &str) -> Option<&'static Haircut> {
    let wanted = name.trim().to_lowercase();
    HAIRCUTS.iter().find(|h| {
        h.name.en.to_lowercase() == wanted || h.name.id.to_lowercase() == wanted
    })
}

fn field_matches(have: &str, want: Option<&str>) -> bool {
    have == "any" || want.map_or(true, |want| want.eq_ignore_ascii_case(have))
}

/// Catalog entries compatible with the collected details.
pub fn suited_to(slots: &RecommendationSlots) -> impl Iterator<Item = &'static Haircut> + '_ {
    HAIRCUTS.iter().filter(move |h| h.suits(slots))
}

impl Haircut {
    pub fn suits(&self, slots: &RecommendationSlots) -> bool {
        field_matches(self.face_shape, slots.face_shape.as_deref())
            && field_matches(self.hair_type, slots.hair_type.as_deref())
            && field_matches(self.style, slots.style_preference.as_deref())
    }

    pub fn cover_image(&self) -> Option<&'static str> {
        self.images.first().copied()
    }

    pub fn display_name(&self, language: Language) -> &'static str {
        self.name.pick(language)
    }
}
