//! Nakshatra (lunar mansion) and pada position of a sidereal longitude.
//!
//! The ecliptic circle is divided into 27 equal nakshatras of 13 deg 20'
//! each, and each nakshatra into 4 padas of 3 deg 20'.

use crate::error::DashaError;
use crate::util::normalize_360;

/// Span of one nakshatra: 360/27 = 13.3333... degrees.
pub const NAKSHATRA_SPAN_27: f64 = 360.0 / 27.0;

/// Span of one pada: 13.3333.../4 = 3.3333... degrees.
pub const PADA_SPAN: f64 = NAKSHATRA_SPAN_27 / 4.0;

/// The 27 nakshatras from Ashwini to Revati.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nakshatra {
    Ashwini,
    Bharani,
    Krittika,
    Rohini,
    Mrigashira,
    Ardra,
    Punarvasu,
    Pushya,
    Ashlesha,
    Magha,
    PurvaPhalguni,
    UttaraPhalguni,
    Hasta,
    Chitra,
    Swati,
    Vishakha,
    Anuradha,
    Jyeshtha,
    Mula,
    PurvaAshadha,
    UttaraAshadha,
    Shravana,
    Dhanishtha,
    Shatabhisha,
    PurvaBhadrapada,
    UttaraBhadrapada,
    Revati,
}

/// All 27 nakshatras in order (0 = Ashwini, 26 = Revati).
pub const ALL_NAKSHATRAS_27: [Nakshatra; 27] = [
    Nakshatra::Ashwini,
    Nakshatra::Bharani,
    Nakshatra::Krittika,
    Nakshatra::Rohini,
    Nakshatra::Mrigashira,
    Nakshatra::Ardra,
    Nakshatra::Punarvasu,
    Nakshatra::Pushya,
    Nakshatra::Ashlesha,
    Nakshatra::Magha,
    Nakshatra::PurvaPhalguni,
    Nakshatra::UttaraPhalguni,
    Nakshatra::Hasta,
    Nakshatra::Chitra,
    Nakshatra::Swati,
    Nakshatra::Vishakha,
    Nakshatra::Anuradha,
    Nakshatra::Jyeshtha,
    Nakshatra::Mula,
    Nakshatra::PurvaAshadha,
    Nakshatra::UttaraAshadha,
    Nakshatra::Shravana,
    Nakshatra::Dhanishtha,
    Nakshatra::Shatabhisha,
    Nakshatra::PurvaBhadrapada,
    Nakshatra::UttaraBhadrapada,
    Nakshatra::Revati,
];

/// Common alternate spellings and abbreviations, keyed case-insensitively.
const NAME_ALIASES: [(&str, Nakshatra); 18] = [
    ("Ashvini", Nakshatra::Ashwini),
    ("Mrigasira", Nakshatra::Mrigashira),
    ("Mrigashirsha", Nakshatra::Mrigashira),
    ("Pushyami", Nakshatra::Pushya),
    ("P Phalguni", Nakshatra::PurvaPhalguni),
    ("U Phalguni", Nakshatra::UttaraPhalguni),
    ("Vishaka", Nakshatra::Vishakha),
    ("Jyestha", Nakshatra::Jyeshtha),
    ("Purva Ashada", Nakshatra::PurvaAshadha),
    ("P Shadha", Nakshatra::PurvaAshadha),
    ("Uttara Ashada", Nakshatra::UttaraAshadha),
    ("U Shadha", Nakshatra::UttaraAshadha),
    ("Sravana", Nakshatra::Shravana),
    ("Dhanishta", Nakshatra::Dhanishtha),
    ("Shatataraka", Nakshatra::Shatabhisha),
    ("Purva Bhadra", Nakshatra::PurvaBhadrapada),
    ("Uttara Bhadra", Nakshatra::UttaraBhadrapada),
    ("Revathi", Nakshatra::Revati),
];

impl Nakshatra {
    /// Sanskrit name of the nakshatra.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ashwini => "Ashwini",
            Self::Bharani => "Bharani",
            Self::Krittika => "Krittika",
            Self::Rohini => "Rohini",
            Self::Mrigashira => "Mrigashira",
            Self::Ardra => "Ardra",
            Self::Punarvasu => "Punarvasu",
            Self::Pushya => "Pushya",
            Self::Ashlesha => "Ashlesha",
            Self::Magha => "Magha",
            Self::PurvaPhalguni => "Purva Phalguni",
            Self::UttaraPhalguni => "Uttara Phalguni",
            Self::Hasta => "Hasta",
            Self::Chitra => "Chitra",
            Self::Swati => "Swati",
            Self::Vishakha => "Vishakha",
            Self::Anuradha => "Anuradha",
            Self::Jyeshtha => "Jyeshtha",
            Self::Mula => "Mula",
            Self::PurvaAshadha => "Purva Ashadha",
            Self::UttaraAshadha => "Uttara Ashadha",
            Self::Shravana => "Shravana",
            Self::Dhanishtha => "Dhanishtha",
            Self::Shatabhisha => "Shatabhisha",
            Self::PurvaBhadrapada => "Purva Bhadrapada",
            Self::UttaraBhadrapada => "Uttara Bhadrapada",
            Self::Revati => "Revati",
        }
    }

    /// 0-based index (Ashwini=0 .. Revati=26).
    pub fn index(self) -> u8 {
        ALL_NAKSHATRAS_27
            .iter()
            .position(|&n| n == self)
            .map_or(0, |i| i as u8)
    }

    /// Nakshatra at a 0-based index, wrapping modulo 27.
    pub const fn from_index(idx: u8) -> Self {
        ALL_NAKSHATRAS_27[(idx % 27) as usize]
    }

    /// Resolve a nakshatra name, tolerant of case, extra whitespace and
    /// the common alternate spellings.
    pub fn from_name(s: &str) -> Option<Self> {
        let cleaned = s.split_whitespace().collect::<Vec<_>>().join(" ");
        ALL_NAKSHATRAS_27
            .iter()
            .copied()
            .find(|n| cleaned.eq_ignore_ascii_case(n.name()))
            .or_else(|| {
                NAME_ALIASES
                    .iter()
                    .find(|(alias, _)| cleaned.eq_ignore_ascii_case(alias))
                    .map(|&(_, n)| n)
            })
    }
}

/// Where a sidereal longitude falls within the nakshatra/pada grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NakshatraPosition {
    /// Longitude normalized to [0, 360).
    pub longitude: f64,
    pub nakshatra: Nakshatra,
    /// Pada number, 1..=4.
    pub pada: u8,
    /// Fraction of the nakshatra already traversed, [0, 1).
    pub nakshatra_fraction: f64,
    /// Fraction of the pada already traversed, [0, 1).
    pub pada_fraction: f64,
}

impl NakshatraPosition {
    /// Locate a sidereal longitude in degrees.
    pub fn from_longitude(sidereal_lon_deg: f64) -> Result<Self, DashaError> {
        if !sidereal_lon_deg.is_finite() {
            return Err(DashaError::InvalidInput("longitude must be finite"));
        }
        let lon = normalize_360(sidereal_lon_deg);
        let nak_idx = ((lon / NAKSHATRA_SPAN_27).floor() as u8).min(26);
        let position_in_nak = (lon - nak_idx as f64 * NAKSHATRA_SPAN_27).max(0.0);
        let pada_idx = ((position_in_nak / PADA_SPAN).floor() as u8).min(3);
        let position_in_pada = (position_in_nak - pada_idx as f64 * PADA_SPAN).max(0.0);
        Ok(Self {
            longitude: lon,
            nakshatra: Nakshatra::from_index(nak_idx),
            pada: pada_idx + 1,
            nakshatra_fraction: (position_in_nak / NAKSHATRA_SPAN_27).min(1.0),
            pada_fraction: (position_in_pada / PADA_SPAN).min(1.0),
        })
    }

    /// 0-based nakshatra index.
    pub fn nakshatra_index(&self) -> u8 {
        self.nakshatra.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_ashwini_pada_1() {
        let p = NakshatraPosition::from_longitude(0.0).unwrap();
        assert_eq!(p.nakshatra, Nakshatra::Ashwini);
        assert_eq!(p.pada, 1);
        assert!(p.nakshatra_fraction.abs() < 1e-12);
        assert!(p.pada_fraction.abs() < 1e-12);
    }

    #[test]
    fn rohini_start() {
        let p = NakshatraPosition::from_longitude(40.0).unwrap();
        assert_eq!(p.nakshatra, Nakshatra::Rohini);
        assert_eq!(p.pada, 1);
        assert!(p.nakshatra_fraction < 1e-9);
    }

    #[test]
    fn mid_pada_fractions() {
        // Ashwini, 1.5 padas in
        let p = NakshatraPosition::from_longitude(1.5 * PADA_SPAN).unwrap();
        assert_eq!(p.pada, 2);
        assert!((p.pada_fraction - 0.5).abs() < 1e-9);
        assert!((p.nakshatra_fraction - 0.375).abs() < 1e-9);
    }

    #[test]
    fn last_degree_is_revati_pada_4() {
        let p = NakshatraPosition::from_longitude(359.999).unwrap();
        assert_eq!(p.nakshatra, Nakshatra::Revati);
        assert_eq!(p.pada, 4);
    }

    #[test]
    fn negative_wraps() {
        let p = NakshatraPosition::from_longitude(-0.5).unwrap();
        assert_eq!(p.nakshatra, Nakshatra::Revati);
    }

    #[test]
    fn nan_rejected() {
        assert!(NakshatraPosition::from_longitude(f64::NAN).is_err());
    }

    #[test]
    fn indices_round_trip() {
        for (i, n) in ALL_NAKSHATRAS_27.iter().enumerate() {
            assert_eq!(n.index() as usize, i);
            assert_eq!(Nakshatra::from_index(i as u8), *n);
        }
    }

    #[test]
    fn from_name_canonical_and_aliases() {
        assert_eq!(Nakshatra::from_name("purva  phalguni"), Some(Nakshatra::PurvaPhalguni));
        assert_eq!(Nakshatra::from_name("Shatataraka"), Some(Nakshatra::Shatabhisha));
        assert_eq!(Nakshatra::from_name("U Shadha"), Some(Nakshatra::UttaraAshadha));
        assert_eq!(Nakshatra::from_name("Dhanishta"), Some(Nakshatra::Dhanishtha));
        assert_eq!(Nakshatra::from_name("Abhijit"), None);
    }
}
