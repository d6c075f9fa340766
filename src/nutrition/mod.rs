mod client;
mod dto;

use async_trait::async_trait;

pub use client::OpenFoodFactsClient;

#[derive(Debug, Clone, PartialEq)]
pub struct NutritionFacts {
    pub name: String,
    pub kcal_100g: f64,
    pub protein_100g: f64,
    pub fat_100g: f64,
    pub carbs_100g: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerGram {
    pub kcal_g: f64,
    pub prot_g: f64,
    pub lip_g: f64,
    pub carb_g: f64,
}

impl NutritionFacts {
    pub fn per_gram(&self) -> PerGram {
        PerGram {
            kcal_g: self.kcal_100g / 100.0,
            prot_g: self.protein_100g / 100.0,
            lip_g: self.fat_100g / 100.0,
            carb_g: self.carbs_100g / 100.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog returned status {status}")]
    Status { status: u16 },
    #[error("catalog still unavailable after {attempts} attempts (last status {status})")]
    Exhausted { attempts: u32, status: u16 },
}

/// Product catalog keyed by barcode. `Ok(None)` means the catalog has no
/// such product; `Err` means the catalog could not be asked.
#[async_trait]
pub trait NutritionClient: Send + Sync {
    async fn fetch(&self, ean: &str) -> Result<Option<NutritionFacts>, LookupError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_gram_divides_by_one_hundred() {
        let facts = fake::facts("Galletas", 450.0, 7.0, 18.0, 12.0);
        let per_gram = facts.per_gram();
        assert_eq!(per_gram.carb_g, 0.12);
        assert_eq!(per_gram.kcal_g, 4.5);
        assert_eq!(per_gram.prot_g, 0.07);
        assert_eq!(per_gram.lip_g, 0.18);
    }
}
