//! Immutable column catalogs and benchmark targets
//!
//! Single source of truth for the mapping from internal column keys to
//! human-readable labels, and for the fixed international benchmark table.
//! Declared once here and passed by reference to every component that needs
//! label lookup.

/// Static mapping from internal column key to human-readable label
#[derive(Debug, Clone, Copy)]
pub struct ColumnCatalog {
    entries: &'static [(&'static str, &'static str)],
}

impl ColumnCatalog {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn label(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
    }

    /// Label for presentation, falling back to the raw key for columns the
    /// catalog does not know.
    pub fn label_or_key<'a>(&self, key: &'a str) -> &'a str {
        self.label(key).unwrap_or(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.label(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// EGRA reading battery item columns
pub const EGRA_SCORES: ColumnCatalog = ColumnCatalog::new(&[
    ("clpm", "Lettres Correctes Par Minute"),
    ("phoneme", "Phonème"),
    ("sound_word", "Mot Lu Correctement"),
    ("cwpm", "Mots Corrects Par Minute"),
    ("listening", "Écoute"),
    ("orf", "Fluidité de Lecture Orale"),
    ("comprehension", "Compréhension"),
]);

/// EGMA numeracy battery item columns
pub const EGMA_SCORES: ColumnCatalog = ColumnCatalog::new(&[
    ("number_id", "Identification des Nombres"),
    ("discrimin", "Discrimination des Nombres"),
    ("missing_number", "Nombre Manquant"),
    ("addition", "Addition"),
    ("subtraction", "Soustraction"),
    ("problems", "Résolution de Problèmes"),
]);

/// Full score battery (EGRA followed by EGMA)
pub const ALL_SCORES: ColumnCatalog = ColumnCatalog::new(&[
    ("clpm", "Lettres Correctes Par Minute"),
    ("phoneme", "Phonème"),
    ("sound_word", "Mot Lu Correctement"),
    ("cwpm", "Mots Corrects Par Minute"),
    ("listening", "Écoute"),
    ("orf", "Fluidité de Lecture Orale"),
    ("comprehension", "Compréhension"),
    ("number_id", "Identification des Nombres"),
    ("discrimin", "Discrimination des Nombres"),
    ("missing_number", "Nombre Manquant"),
    ("addition", "Addition"),
    ("subtraction", "Soustraction"),
    ("problems", "Résolution de Problèmes"),
]);

/// Demographic and contextual survey columns
pub const CONTEXT_FIELDS: ColumnCatalog = ColumnCatalog::new(&[
    ("ses", "Statut Socio-Économique"),
    ("home_support", "Soutien Parental"),
    ("stgender", "Genre"),
    ("school", "École"),
    ("language_teaching", "Langue d'Enseignement"),
    ("st_english_home", "Anglais à la Maison"),
    ("st_dutch_home", "Néerlandais à la Maison"),
    ("st_other_language", "Autre Langue"),
    ("teacher_experience", "Expérience de l'Enseignant"),
    ("teacher_training", "Formation de l'Enseignant"),
    ("teaching_method", "Méthode d'Enseignement"),
    ("use_of_materials", "Utilisation de Matériel"),
]);

/// One fixed external benchmark target for a score column
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkEntry {
    pub code: &'static str,
    pub label: &'static str,
    pub target: f64,
}

/// International benchmark targets per score column
pub const INTERNATIONAL_BENCHMARKS: &[BenchmarkEntry] = &[
    BenchmarkEntry { code: "clpm", label: "Lettres Correctes Par Minute", target: 60.0 },
    BenchmarkEntry { code: "phoneme", label: "Phonème", target: 8.0 },
    BenchmarkEntry { code: "sound_word", label: "Mot Lu Correctement", target: 6.0 },
    BenchmarkEntry { code: "cwpm", label: "Mots Corrects Par Minute", target: 50.0 },
    BenchmarkEntry { code: "listening", label: "Écoute", target: 3.0 },
    BenchmarkEntry { code: "orf", label: "Fluidité de Lecture Orale", target: 55.0 },
    BenchmarkEntry { code: "comprehension", label: "Compréhension", target: 4.0 },
    BenchmarkEntry { code: "number_id", label: "Identification des Nombres", target: 25.0 },
    BenchmarkEntry { code: "discrimin", label: "Discrimination des Nombres", target: 8.0 },
    BenchmarkEntry { code: "missing_number", label: "Nombre Manquant", target: 7.0 },
    BenchmarkEntry { code: "addition", label: "Addition", target: 8.0 },
    BenchmarkEntry { code: "subtraction", label: "Soustraction", target: 7.0 },
    BenchmarkEntry { code: "problems", label: "Résolution de Problèmes", target: 4.0 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        assert_eq!(EGRA_SCORES.label("clpm"), Some("Lettres Correctes Par Minute"));
        assert_eq!(EGRA_SCORES.label("number_id"), None);
        assert_eq!(EGMA_SCORES.label("number_id"), Some("Identification des Nombres"));
    }

    #[test]
    fn test_label_or_key_falls_back() {
        assert_eq!(ALL_SCORES.label_or_key("nonsense"), "nonsense");
        assert_eq!(ALL_SCORES.label_or_key("orf"), "Fluidité de Lecture Orale");
    }

    #[test]
    fn test_all_scores_is_union_of_batteries() {
        assert_eq!(ALL_SCORES.len(), EGRA_SCORES.len() + EGMA_SCORES.len());
        for key in EGRA_SCORES.keys().chain(EGMA_SCORES.keys()) {
            assert!(ALL_SCORES.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_benchmarks_cover_all_scores() {
        assert_eq!(INTERNATIONAL_BENCHMARKS.len(), ALL_SCORES.len());
        for entry in INTERNATIONAL_BENCHMARKS {
            assert!(ALL_SCORES.contains(entry.code));
            assert!(entry.target > 0.0);
        }
    }

    #[test]
    fn test_benchmark_values_match_published_standards() {
        let clpm = INTERNATIONAL_BENCHMARKS
            .iter()
            .find(|e| e.code == "clpm")
            .unwrap();
        assert_eq!(clpm.target, 60.0);
        let problems = INTERNATIONAL_BENCHMARKS
            .iter()
            .find(|e| e.code == "problems")
            .unwrap();
        assert_eq!(problems.target, 4.0);
    }
}
