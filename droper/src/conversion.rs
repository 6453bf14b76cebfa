use crate::market::Offer;
use crate::schema::{ListedProduct, ListingResponse};
use crate::{Error, Result};

impl TryFrom<ListedProduct> for Offer {
    type Error = Error;

    fn try_from(product: ListedProduct) -> Result<Self> {
        Ok(Self {
            id: product.id,
            price: product.price.parse()?,
            verified: product.verified_seller,
        })
    }
}

impl TryFrom<ListingResponse> for Vec<Offer> {
    type Error = Error;

    fn try_from(response: ListingResponse) -> Result<Self> {
        response
            .new
            .products
            .into_iter()
            .map(Offer::try_from)
            .collect()
    }
}
