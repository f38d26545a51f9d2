//! Class label set
//!
//! The model emits one logit per class index; the label set maps each index
//! back to the identifier returned to clients.

use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::path::Path;
use std::sync::Arc;

/// Built-in first-generation label set the default artifact was trained on.
///
/// Ordering matches the training data loader and must not change.
pub const POKEMON_LABELS: &[&str] = &[
    "001_bulbasaur",
    "002_ivysaur",
    "003_venusaur",
    "004_charmander",
    "005_charmeleon",
    "006_charizard",
    "008_wartortle",
    "009_blastoise",
    "010_caterpie",
    "011_metapod",
    "012_butterfree",
    "013_weedle",
    "014_kakuna",
    "015_beedrill",
    "017_pidgeotto",
    "018_pidgeot",
    "019_rattata",
    "020_ratticate",
    "021_spearow",
    "022_fearow",
    "023_ekans",
    "024_arbok",
    "025_pikachu",
    "026_raichu",
    "027_sandshrew",
    "028_sandslash",
    "029_nidoran_f",
    "030_nidorina",
    "031_nidoqueen",
    "032_nidoran_m",
    "033_nidorino",
    "034_nidoking",
    "035_clefairy",
    "036_clefable",
    "037_vulpix",
    "038_ninetales",
    "039_jigglypuff",
    "040_wigglytuff",
    "041_zubat",
    "042_golbat",
    "043_oddish",
    "044_gloom",
    "045_vileplume",
    "046_paras",
    "047_parasect",
    "048_venonat",
    "049_venomoth",
    "050_diglett",
    "051_dugtrio",
    "052_meowth",
    "053_persian",
    "054_psyduck",
    "055_golduck",
    "056_mankey",
    "057_primeape",
    "058_growlithe",
    "059_arcanine",
    "060_poliwag",
    "061_poliwhirl",
    "062_poliwrath",
    "063_abra",
    "064_kadabra",
    "065_alakazam",
    "066_machop",
    "067_machoke",
    "068_machamp",
    "069_bellsprout",
    "070_weepinbell",
    "071_victreebel",
    "072_tentacool",
    "073_tentacruel",
    "074_geodude",
    "075_graveler",
    "076_golem",
    "077_ponyta",
    "078_rapidash",
    "079_slowpoke",
    "080_slowbro",
    "081_magnemite",
    "082_magneton",
    "083_farfetch_d",
    "084_doduo",
    "085_dodrio",
    "086_seel",
    "087_dewgong",
    "088_grimer",
    "089_muk",
    "090_shellder",
    "091_cloyster",
    "092_gastly",
    "093_haunter",
    "094_gengar",
    "095_onix",
    "096_drowzee",
    "097_hypno",
    "098_krabby",
    "099_kingler",
    "100_voltorb",
    "101_electrode",
    "102_exeggcute",
    "103_exeggutor",
    "104_cubone",
    "105_marowak",
    "106_hitmonlee",
    "107_hitmonchan",
    "108_lickitung",
    "109_koffing",
    "110_weezing",
    "111_rhyhorn",
    "112_rhydon",
    "113_chansey",
    "114_tangela",
    "115_kangaskhan",
    "116_horsea",
    "117_seadra",
    "118_goldeen",
    "119_seaking",
    "120_staryu",
    "121_starmie",
    "122_mr_mime",
    "123_scyther",
    "124_jynx",
    "125_electabuzz",
    "126_magmar",
    "127_pinsir",
    "128_tauros",
    "129_magikarp",
    "130_gyarados",
    "131_lapras",
    "132_ditto",
    "133_eevee",
    "134_vaporeon",
    "135_jolteon",
    "136_flareon",
    "137_porygon",
    "138_omanyte",
    "139_omastar",
    "140_kabuto",
    "141_kabutops",
    "142_aerodactyl",
    "143_snorlax",
    "144_articuno",
    "145_zapdos",
    "146_moltres",
    "147_dratini",
    "148_dragonair",
    "149_dragonite",
    "150_mewtwo",
    "151_mew",
];

/// Ordered, immutable list of class labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    /// Create a label set from owned labels
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::config("label set must contain at least one label"));
        }
        if let Some(blank) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(Error::config(format!("label at index {} is blank", blank)));
        }
        Ok(Self {
            labels: labels.into(),
        })
    }

    /// The built-in Pokemon label set
    pub fn builtin() -> Self {
        Self {
            labels: POKEMON_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Parse one label per line, skipping blank lines and `#` comments
    pub fn from_lines(text: &str) -> Result<Self> {
        let labels = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::new(labels)
    }

    /// Load a label file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read label file {}: {}", path.display(), e))
        })?;
        let set = Self::from_lines(&text)?;
        tracing::debug!("Loaded {} labels from {}", set.len(), path.display());
        Ok(set)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a class index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Class index for a label
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.labels.iter())
    }
}
