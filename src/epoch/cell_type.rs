/// Shorthand retinal cell-type codes and their descriptive names.
const CELL_TYPE_NAMES: &[(&str, &str)] = &[
    ("OnP", "ON-parasol"),
    ("OffP", "OFF-parasol"),
    ("OnM", "ON-midget"),
    ("OffM", "OFF-midget"),
    ("BlueOffM", "Blue OFF-midget"),
    ("OnS", "ON-stratified"),
    ("OffS", "OFF-stratified"),
    ("SBC", "small-bistratified"),
    ("BT", "bistratified-transient"),
    ("Tufted", "tufted"),
    ("OnLarge", "ON-large"),
    ("OffLarge", "OFF-large"),
    ("OnMystery", "ON-mystery"),
    ("OffMystery", "OFF-mystery"),
    ("OffBoring", "OFF-boring"),
    ("OnWiggles", "ON-wiggles"),
    ("InterestingIfTrue", "interesting-if-true"),
    ("BigMas", "big-mas"),
    ("Spotty", "spotty"),
    ("Shadow", "shadow"),
    ("Blobby", "blobby"),
    ("Xmas", "xmas"),
    ("OnAmacrine", "ON-amacrine"),
    ("OffAmacrine", "OFF-amacrine"),
    ("BlueAmacrine", "blue-amacrine"),
    ("Amacrine", "amacrine"),
    ("A1", "A1-amacrine"),
    ("RB", "rod-bipolar"),
    ("BlueMystery", "blue-mystery"),
    ("BluePeaky", "blue-peaky"),
    ("RGC", "RGC"),
    ("Unknown", "unknown"),
];

/// Ganglion cell types, which get the `RGC\` prefix
const GANGLION_TYPES: &[&str] = &[
    "OnP", "OffP", "OnM", "OffM", "BlueOffM", "OnS", "OffS", "SBC", "BT", "Tufted", "OnLarge",
    "OffLarge", "OnMystery", "OffMystery", "OffBoring", "OnWiggles", "InterestingIfTrue",
    "BigMas", "Spotty", "Shadow", "Blobby", "Xmas",
];

/// Expand a shorthand cell-type code. Unknown codes are returned unchanged.
pub fn full_cell_type_name(shorthand: &str) -> String {
    let Some((_, name)) = CELL_TYPE_NAMES.iter().find(|(code, _)| *code == shorthand) else {
        return shorthand.to_string();
    };
    if GANGLION_TYPES.contains(&shorthand) {
        format!("RGC\\{}", name)
    } else {
        name.to_string()
    }
}
