use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FoodOrigin {
    Group,
    Barcode,
}

impl FoodOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodOrigin::Group => "group",
            FoodOrigin::Barcode => "barcode",
        }
    }
}
