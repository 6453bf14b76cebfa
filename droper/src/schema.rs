use crate::ProductId;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub(crate) struct ListingResponse {
    #[serde(rename = "novos")]
    pub new: ListingSection,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ListingSection {
    #[serde(rename = "produtos")]
    pub products: Vec<ListedProduct>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ListedProduct {
    pub id: ProductId,
    /// Final displayed price as a textual decimal.
    #[serde(rename = "precof")]
    pub price: String,
    #[serde(rename = "isVendedorAutenticado", default)]
    pub verified_seller: bool,
}

#[derive(Serialize, Debug)]
pub(crate) struct PriceUpdate {
    #[serde(rename = "preco")]
    pub price: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PriceUpdateResponse {
    #[serde(rename = "precof")]
    pub price: String,
}
