use serde::{Deserialize, Serialize};

/// Represents a product on the shop's shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            price,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// The shop's static product list, prices in ZAR.
pub fn catalog() -> Vec<Product> {
    vec![
        Product::new(
            "lavender-01",
            "Honey Lavender Soap",
            "Calming lavender essential oil, gentle on sensitive skin.",
            60.0,
        ),
        Product::new(
            "citrus-01",
            "Citrus Zest",
            "Bright, zesty bar with uplifting citrus essential oils.",
            60.0,
        )
        .with_image("images/Zesty Citrus.png"),
        Product::new(
            "hotproc-01",
            "Natural, unfragranced tallow soap",
            "Pure and simple tallow soap, unfragranced and gentle on all skin types.",
            50.0,
        ),
        Product::new(
            "coffee-castoroil-01",
            "Coffee and Castor Oil Soap",
            "Energizing coffee-infused soap with natural exfoliating properties and rich castor oil for deep nourishment.",
            60.0,
        )
        .with_image("images/Coffee Castor Oil.png"),
        Product::new(
            "lotion-bar-01",
            "Natural Body Lotion Bars",
            "Nourishing solid lotion bars made with natural ingredients to moisturize and protect your skin.",
            70.0,
        ),
        Product::new(
            "body-butter-01",
            "Natural Body Butters",
            "Rich, creamy body butters made with natural ingredients to deeply nourish and hydrate your skin. 100ml.",
            150.0,
        ),
        Product::new(
            "whipped-body-butter-01",
            "Whipped Body Butter",
            "Light, airy whipped body butter that melts into your skin, providing deep moisture without the greasy feel. 100ml.",
            200.0,
        ),
        Product::new(
            "face-serum-01",
            "Natural Face Serum",
            "Made-to-order nourishing face serum. Ingredients: flaxseed gel, castor oil, frankincense essential oil. 30ml.",
            90.0,
        ),
    ]
}

pub fn find_product(id: &str) -> Option<Product> {
    catalog().into_iter().find(|p| p.id == id)
}
