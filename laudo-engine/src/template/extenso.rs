//! Brazilian Portuguese numbers in full ("por extenso")
//!
//! The number is split into groups of three digits. Each group is spelled on its own
//! (`cem` for exactly one hundred, `cento` otherwise) and followed by its scale word. The
//! thousands group drops the leading "um" (`mil`, not `um mil`). Groups are separated by a
//! space, except that the last non-zero group is joined with "e" when it is below one
//! hundred or a whole hundred: `mil e um`, `um milhão e duzentos mil`, but
//! `mil duzentos e trinta e quatro`.

const UNITS: [&str; 20] = [
    "zero",
    "um",
    "dois",
    "três",
    "quatro",
    "cinco",
    "seis",
    "sete",
    "oito",
    "nove",
    "dez",
    "onze",
    "doze",
    "treze",
    "quatorze",
    "quinze",
    "dezesseis",
    "dezessete",
    "dezoito",
    "dezenove",
];

const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];

const HUNDREDS: [&str; 10] = [
    "",
    "cento",
    "duzentos",
    "trezentos",
    "quatrocentos",
    "quinhentos",
    "seiscentos",
    "setecentos",
    "oitocentos",
    "novecentos",
];

/// (singular, plural) per group index; index 1 is handled apart.
const SCALES: [(&str, &str); 7] = [
    ("", ""),
    ("mil", "mil"),
    ("milhão", "milhões"),
    ("bilhão", "bilhões"),
    ("trilhão", "trilhões"),
    ("quatrilhão", "quatrilhões"),
    ("quintilhão", "quintilhões"),
];

/// Spell `n` in full.
pub fn to_words(n: u64) -> String {
    if n == 0 {
        return UNITS[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push((rest % 1000) as u16);
        rest /= 1000;
    }

    // (group value, spelled group) from the most significant group down
    let spelled: Vec<(u16, String)> = groups
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, value)| **value > 0)
        .map(|(scale, value)| (*value, spell_scaled(*value, scale)))
        .collect();

    let mut out = String::new();
    let last = spelled.len() - 1;
    for (index, (value, words)) in spelled.iter().enumerate() {
        if index > 0 {
            if index == last && (*value < 100 || value % 100 == 0) {
                out.push_str(" e ");
            } else {
                out.push(' ');
            }
        }
        out.push_str(words);
    }
    out
}

fn spell_scaled(value: u16, scale: usize) -> String {
    match scale {
        0 => spell_group(value),
        1 if value == 1 => SCALES[1].0.to_string(),
        1 => format!("{} {}", spell_group(value), SCALES[1].0),
        _ => {
            let (singular, plural) = SCALES[scale];
            let word = if value == 1 { singular } else { plural };
            format!("{} {}", spell_group(value), word)
        }
    }
}

/// Spell 1..=999.
fn spell_group(value: u16) -> String {
    if value == 100 {
        return "cem".to_string();
    }
    let hundreds = usize::from(value / 100);
    let tens = usize::from(value % 100);

    let mut parts: Vec<&str> = Vec::new();
    if hundreds > 0 {
        parts.push(HUNDREDS[hundreds]);
    }
    if tens > 0 {
        if tens < 20 {
            parts.push(UNITS[tens]);
        } else {
            parts.push(TENS[tens / 10]);
            if tens % 10 > 0 {
                parts.push(UNITS[tens % 10]);
            }
        }
    }
    parts.join(" e ")
}
