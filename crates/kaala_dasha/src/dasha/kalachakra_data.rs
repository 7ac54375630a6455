//! Kalachakra dasha static data: sign years, nakshatra groups and the
//! per-group, per-pada progression rows.

use crate::nakshatra::Nakshatra;
use crate::rashi::Rashi;

/// Fixed sign durations in years (indexed by rashi 0-11: Mesha..Meena).
pub const KALACHAKRA_SIGN_YEARS: [f64; 12] = [
    7.0,  // 0  Mesha (Aries)
    16.0, // 1  Vrishabha (Taurus)
    9.0,  // 2  Mithuna (Gemini)
    21.0, // 3  Karka (Cancer)
    5.0,  // 4  Simha (Leo)
    9.0,  // 5  Kanya (Virgo)
    16.0, // 6  Tula (Libra)
    7.0,  // 7  Vrischika (Scorpio)
    10.0, // 8  Dhanu (Sagittarius)
    4.0,  // 9  Makara (Capricorn)
    4.0,  // 10 Kumbha (Aquarius)
    10.0, // 11 Meena (Pisces)
];

/// Years ruled by a sign.
pub const fn sign_years(rashi: Rashi) -> f64 {
    KALACHAKRA_SIGN_YEARS[rashi.index() as usize]
}

/// The six nakshatra groups: three Savya (direct) and three Apsavya
/// (indirect) triads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KalachakraGroup {
    Savya1,
    Savya2,
    Savya3,
    Apsavya1,
    Apsavya2,
    Apsavya3,
}

impl KalachakraGroup {
    /// Short key: S1..S3, A1..A3.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Savya1 => "S1",
            Self::Savya2 => "S2",
            Self::Savya3 => "S3",
            Self::Apsavya1 => "A1",
            Self::Apsavya2 => "A2",
            Self::Apsavya3 => "A3",
        }
    }

    pub const fn is_savya(self) -> bool {
        matches!(self, Self::Savya1 | Self::Savya2 | Self::Savya3)
    }

    /// Group membership of a nakshatra.
    pub const fn of(nakshatra: Nakshatra) -> Self {
        use Nakshatra::*;
        match nakshatra {
            Ashwini | Punarvasu | Hasta | Mula | PurvaBhadrapada => Self::Savya1,
            Bharani | Pushya | Chitra | PurvaAshadha | UttaraBhadrapada => Self::Savya2,
            Krittika | Ashlesha | Swati | UttaraAshadha | Revati => Self::Savya3,
            Rohini | Magha | Vishakha | Shravana => Self::Apsavya1,
            Mrigashira | PurvaPhalguni | Anuradha | Dhanishtha => Self::Apsavya2,
            Ardra | UttaraPhalguni | Jyeshtha | Shatabhisha => Self::Apsavya3,
        }
    }
}

/// One progression row: the 9-sign sequence for a group and pada.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalachakraRow {
    /// Signs in traversal order.
    pub sequence: [Rashi; 9],
    /// Total nominal years of the sequence.
    pub paramayu: f64,
    pub deha: Rashi,
    pub jeeva: Rashi,
}

const fn row(sequence: [Rashi; 9], paramayu: f64, deha: Rashi, jeeva: Rashi) -> KalachakraRow {
    KalachakraRow {
        sequence,
        paramayu,
        deha,
        jeeva,
    }
}

const ARI: Rashi = Rashi::Mesha;
const TAU: Rashi = Rashi::Vrishabha;
const GEM: Rashi = Rashi::Mithuna;
const CAN: Rashi = Rashi::Karka;
const LEO: Rashi = Rashi::Simha;
const VIR: Rashi = Rashi::Kanya;
const LIB: Rashi = Rashi::Tula;
const SCO: Rashi = Rashi::Vrischika;
const SAG: Rashi = Rashi::Dhanu;
const CAP: Rashi = Rashi::Makara;
const AQU: Rashi = Rashi::Kumbha;
const PIS: Rashi = Rashi::Meena;

// S1 and S3 share one table. Pada 2 differs from the upstream table, which
// gives Deha Taurus (absent from the sequence) and Jeeva Cancer. Here it uses
// the first and last signs of its sequence, Capricorn and Gemini, like every
// other row.
const SAVYA_1_3: [KalachakraRow; 4] = [
    row([ARI, TAU, GEM, CAN, LEO, VIR, LIB, SCO, SAG], 100.0, ARI, SAG),
    row([CAP, AQU, PIS, SCO, LIB, VIR, CAN, LEO, GEM], 85.0, CAP, GEM),
    row([TAU, ARI, PIS, AQU, CAP, SAG, ARI, TAU, GEM], 83.0, TAU, GEM),
    row([CAN, LEO, VIR, LIB, SCO, SAG, CAP, AQU, PIS], 86.0, CAN, PIS),
];

const SAVYA_2: [KalachakraRow; 4] = [
    row([SCO, LIB, VIR, CAN, LEO, GEM, TAU, ARI, PIS], 100.0, SCO, PIS),
    row([AQU, CAP, SAG, ARI, TAU, GEM, CAN, LEO, VIR], 85.0, AQU, VIR),
    row([LIB, SCO, SAG, CAP, AQU, PIS, SCO, LIB, VIR], 83.0, LIB, VIR),
    row([CAN, LEO, GEM, TAU, ARI, PIS, AQU, CAP, SAG], 86.0, CAN, SAG),
];

// Apsavya rows start at Jeeva and end at Deha.
const APSAVYA_1_3: [KalachakraRow; 4] = [
    row([SAG, CAP, AQU, PIS, ARI, TAU, GEM, LEO, CAN], 86.0, CAN, SAG),
    row([VIR, LIB, SCO, PIS, AQU, CAP, SAG, SCO, LIB], 83.0, LIB, VIR),
    row([VIR, LEO, CAN, GEM, TAU, ARI, SAG, CAP, AQU], 85.0, AQU, VIR),
    row([PIS, ARI, TAU, GEM, LEO, CAN, VIR, LIB, SCO], 100.0, SCO, PIS),
];

const APSAVYA_2: [KalachakraRow; 4] = [
    row([PIS, AQU, CAP, SAG, SCO, LIB, VIR, LEO, CAN], 86.0, CAN, PIS),
    row([GEM, TAU, ARI, SAG, CAP, AQU, PIS, ARI, TAU], 83.0, TAU, GEM),
    row([GEM, LEO, CAN, VIR, LIB, SCO, PIS, AQU, CAP], 85.0, CAP, GEM),
    row([SAG, SCO, LIB, VIR, LEO, CAN, GEM, TAU, ARI], 100.0, ARI, SAG),
];

/// Progression row for a group and pada (1..=4).
pub fn kalachakra_row(group: KalachakraGroup, pada: u8) -> Option<&'static KalachakraRow> {
    let table = match group {
        KalachakraGroup::Savya1 | KalachakraGroup::Savya3 => &SAVYA_1_3,
        KalachakraGroup::Savya2 => &SAVYA_2,
        KalachakraGroup::Apsavya1 | KalachakraGroup::Apsavya3 => &APSAVYA_1_3,
        KalachakraGroup::Apsavya2 => &APSAVYA_2,
    };
    table.get((pada as usize).checked_sub(1)?)
}
