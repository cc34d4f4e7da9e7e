//! Localized UI strings.
//!
//! The core never sees a language; only the TUI picks a `Texts` table.

/// UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Turkish,
    English,
}

impl Language {
    /// Parse `tr` / `en` (or the language's own name).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "tr" | "türkçe" | "turkish" => Some(Self::Turkish),
            "en" | "english" => Some(Self::English),
            _ => None,
        }
    }

    /// The other language.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Turkish => Self::English,
            Self::English => Self::Turkish,
        }
    }

    /// Name shown in the language switch.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Turkish => "Türkçe",
            Self::English => "English",
        }
    }

    #[must_use]
    pub fn texts(self) -> &'static Texts {
        match self {
            Self::Turkish => &TURKISH,
            Self::English => &ENGLISH,
        }
    }

    /// Banner for a required column absent from an upload.
    #[must_use]
    pub fn missing_column(self, column: &str) -> String {
        match self {
            Self::Turkish => format!("Hata: '{column}' kolonu eksik."),
            Self::English => format!("Error: column '{column}' is missing."),
        }
    }
}

/// One language's strings.
#[derive(Debug)]
pub struct Texts {
    pub title: &'static str,
    pub description: &'static str,
    pub privacy_warning: &'static str,
    pub tab_single: &'static str,
    pub tab_bulk: &'static str,
    pub gen_expression: &'static str,
    pub expression_suffix: &'static str,
    pub predict: &'static str,
    pub low_risk: &'static str,
    pub high_risk: &'static str,
    pub model_input: &'static str,
    pub no_result: &'static str,
    pub bulk_upload: &'static str,
    pub required_columns: &'static str,
    pub upload_path: &'static str,
    pub upload_hint: &'static str,
    pub predictions_ready: &'static str,
    pub processing_error: &'static str,
    pub nothing_to_save: &'static str,
    pub saved_to: &'static str,
    pub csv_example: &'static str,
    pub download_excel: &'static str,
    pub rows: &'static str,
    pub note: &'static str,
    pub key_select: &'static str,
    pub key_change: &'static str,
    pub key_process: &'static str,
    pub key_scroll: &'static str,
    pub key_language: &'static str,
    pub key_quit: &'static str,
}

static TURKISH: Texts = Texts {
    title: "Kolon Kanseri Tahmin Aracı",
    description: "Erken teşhis hayat kurtarır! Bu araç, belirli gen ifadelerine göre kolon kanseri riski tahmini yapar.",
    privacy_warning: "Uyarı: Girdiğiniz veriler kaydedilmez ve tamamen gizlidir.",
    tab_single: "Tekli Tahmin",
    tab_bulk: "Toplu Tahmin",
    gen_expression: "Gen İfadelerini Giriniz",
    expression_suffix: "ifadesi",
    predict: "Tahmin Et",
    low_risk: "Düşük risk: Model kanser riski tespit etmedi.",
    high_risk: "Yüksek risk: Model kolon kanseri riski tespit etti. Lütfen bir uzmana danışın.",
    model_input: "Model Girişi",
    no_result: "Değerleri seçip Enter ile tahmin edin",
    bulk_upload: "Excel Dosyası ile Toplu Tahmin",
    required_columns: "Excel dosyanız şu kolonları içermelidir:",
    upload_path: "Excel dosyası yükleyin",
    upload_hint: "dosya yolu (.xlsx)",
    predictions_ready: "Tahminler başarıyla oluşturuldu.",
    processing_error: "Dosya işlenirken hata oluştu",
    nothing_to_save: "Kaydedilecek tahmin yok",
    saved_to: "Kaydedildi",
    csv_example: "Örnek Excel İndir",
    download_excel: "Excel Olarak İndir",
    rows: "satır",
    note: "Not: Bu araç yalnızca eğitim amaçlıdır ve tıbbi tanı yerine geçmez.",
    key_select: "Gen seç",
    key_change: "Değer değiştir",
    key_process: "İşle",
    key_scroll: "Kaydır",
    key_language: "Dil",
    key_quit: "Çıkış",
};

static ENGLISH: Texts = Texts {
    title: "Colon Cancer Prediction Tool",
    description: "Early diagnosis saves lives! This tool predicts colon cancer risk based on specific gene expressions.",
    privacy_warning: "Warning: The data you enter is not saved and is completely private.",
    tab_single: "Single Prediction",
    tab_bulk: "Bulk Prediction",
    gen_expression: "Enter Gene Expressions",
    expression_suffix: "expression",
    predict: "Predict",
    low_risk: "Low risk: The model did not detect cancer risk.",
    high_risk: "High risk: The model detected colon cancer risk. Please consult a specialist.",
    model_input: "Model Input",
    no_result: "Choose the readings and press Enter to predict",
    bulk_upload: "Bulk Prediction via Excel",
    required_columns: "Your Excel file must contain these columns:",
    upload_path: "Upload an Excel file",
    upload_hint: "file path (.xlsx)",
    predictions_ready: "Predictions created successfully.",
    processing_error: "An error occurred while processing the file",
    nothing_to_save: "No predictions to save",
    saved_to: "Saved to",
    csv_example: "Download Example Excel",
    download_excel: "Download as Excel",
    rows: "rows",
    note: "Note: This tool is for educational purposes only and does not replace medical diagnosis.",
    key_select: "Select marker",
    key_change: "Change value",
    key_process: "Process",
    key_scroll: "Scroll",
    key_language: "Language",
    key_quit: "Quit",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("tr"), Some(Language::Turkish));
        assert_eq!(Language::from_code(" EN "), Some(Language::English));
        assert_eq!(Language::from_code("Türkçe"), Some(Language::Turkish));
        assert_eq!(Language::from_code("de"), None);
    }

    #[test]
    fn test_toggle_round_trips() {
        assert_eq!(Language::Turkish.toggle(), Language::English);
        assert_eq!(Language::Turkish.toggle().toggle(), Language::Turkish);
    }

    #[test]
    fn test_tables_differ_per_language() {
        let tr = Language::Turkish.texts();
        let en = Language::English.texts();
        assert_ne!(tr.high_risk, en.high_risk);
        assert!(tr.note.starts_with("Not:"));
        assert!(en.note.starts_with("Note:"));
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let msg = Language::English.missing_column("SDC2 SET-3");
        assert!(msg.contains("'SDC2 SET-3'"));
        assert!(Language::Turkish.missing_column("SDC2 SET-3").contains("eksik"));
    }
}
