use std::sync::Arc;

use uuid::Uuid;

use crate::domain::catalog::{
    clamp_limit, Category, Product, DEFAULT_FEATURED_LIMIT, DEFAULT_SEARCH_LIMIT,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub fn featured(&self, limit: Option<i64>) -> Result<Vec<Product>, DomainError> {
        self.repo
            .featured(clamp_limit(limit, DEFAULT_FEATURED_LIMIT))
    }

    /// A blank term falls back to the featured list.
    pub fn search(&self, term: &str, limit: Option<i64>) -> Result<Vec<Product>, DomainError> {
        let term = term.trim();
        if term.is_empty() {
            return self.featured(limit);
        }
        self.repo
            .search(term, clamp_limit(limit, DEFAULT_SEARCH_LIMIT))
    }

    pub fn product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.repo.find_product(id)?.ok_or(DomainError::NotFound)
    }

    pub fn categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.list_categories()
    }

    pub fn category(&self, id: Uuid) -> Result<(Category, Vec<Product>), DomainError> {
        let category = self.repo.find_category(id)?.ok_or(DomainError::NotFound)?;
        Ok((category, self.category_products(id)?))
    }

    /// Active products in one category. An unknown category yields an empty
    /// list rather than `NotFound`.
    pub fn category_products(&self, id: Uuid) -> Result<Vec<Product>, DomainError> {
        self.repo.products_in_category(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::{fixtures, InMemoryStore};

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryStore::with_sample_catalog()))
    }

    #[test]
    fn blank_search_returns_featured() {
        let svc = service();
        let featured = svc.featured(None).expect("featured");
        let blank = svc.search("   ", None).expect("search");
        assert_eq!(
            blank.iter().map(|p| p.id).collect::<Vec<_>>(),
            featured.iter().map(|p| p.id).collect::<Vec<_>>()
        );
        assert!(blank.iter().all(|p| p.is_featured));
    }

    #[test]
    fn search_matches_by_name_case_insensitively() {
        let results = service().search("zz", None).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, fixtures::ZZ_PLANT);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let err = service().product(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[test]
    fn category_lists_its_products() {
        let (category, products) = service().category(fixtures::SUCCULENT).expect("category");
        assert_eq!(category.name, "Succulent");
        assert!(products.iter().all(|p| p.category_id == Some(fixtures::SUCCULENT)));
        assert!(!products.is_empty());
    }

    #[test]
    fn category_products_of_unknown_category_is_empty() {
        let products = service().category_products(Uuid::new_v4()).expect("products");
        assert!(products.is_empty());
    }
}
