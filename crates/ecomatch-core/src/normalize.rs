//! Text cleaning shared by every matching stage.

/// Normalize free text for matching.
///
/// Lowercases, replaces every character outside `a-z0-9` and whitespace
/// with a space, collapses runs of three or more identical characters to a
/// single one, then collapses whitespace and trims.
///
/// The output is a fixed point: `normalize(&normalize(x)) == normalize(x)`.
///
/// ```rust
/// use ecomatch_core::normalize::normalize;
///
/// assert_eq!(normalize("Soooo GOOD!!"), "so good");
/// assert_eq!(normalize("  eco-bag  (XL) "), "eco bag xl");
/// ```
pub fn normalize(text: &str) -> String {
    let mapped: Vec<char> = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut collapsed: Vec<char> = Vec::with_capacity(mapped.len());
    let mut i = 0;
    while i < mapped.len() {
        let c = mapped[i];
        let mut run = 1;
        while i + run < mapped.len() && mapped[i + run] == c {
            run += 1;
        }
        if run >= 3 {
            collapsed.push(c);
        } else {
            collapsed.extend(std::iter::repeat(c).take(run));
        }
        i += run;
    }

    collapsed
        .into_iter()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_repeated_characters() {
        assert_eq!(normalize("soooo good"), "so good");
        assert_eq!(normalize("noooo!!!"), "no");
    }

    #[test]
    fn keeps_double_letters() {
        assert_eq!(normalize("Bottle"), "bottle");
        assert_eq!(normalize("coffee cup"), "coffee cup");
    }

    #[test]
    fn replaces_punctuation_and_trims() {
        assert_eq!(normalize("  Bamboo-Brush, (large)  "), "bamboo brush large");
        assert_eq!(normalize("CO₂e"), "co e");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn runs_separated_by_punctuation_collapse_after_mapping() {
        // "a-a-a" maps to "a a a", which has no run of identical characters
        assert_eq!(normalize("a-a-a"), "a a a");
        // "x!!!y" maps to "x   y": the spaces collapse with the whitespace pass
        assert_eq!(normalize("x!!!y"), "x y");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "soooo good",
            "Recommend a SMALL bottle please!!!",
            "aaa  bbb\tccc\n",
            "eco—bag ٣ ünïcödé",
            "   ",
            "12l 25-piece set",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
