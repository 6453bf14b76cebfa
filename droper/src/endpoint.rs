use crate::ProductId;
use strum_macros::Display;

/// Droper endpoints used by the repricer
#[derive(Display, Copy, Clone, Debug)]
pub(crate) enum Endpoint {
    #[strum(to_string = "/api/drops/v6/{drop_id}/anuncios/{listing_id}")]
    Listing { drop_id: u64, listing_id: u64 },
    #[strum(to_string = "/api/adm/produto/{product_id}/preco")]
    UpdatePrice { product_id: ProductId },
}
