use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Amount, CategoryId, ProductId, SubcategoryId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Amount,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

fn visible_by_default() -> bool {
    true
}

/// Fields of a product before it is given an id.
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub title: String,
    pub price: Amount,
    pub description: String,
    pub cover_url: Option<String>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub price: Option<Amount>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub visible: Option<bool>,
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Category → subcategory → product tree of a storefront.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog { categories: Vec::new() }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn add_category(&mut self, name: &str, visible: bool) -> Result<Category> {
        let category = Category {
            id: CategoryId::new(),
            name: required("category name", name)?,
            visible,
            subcategories: Vec::new(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn update_category(&mut self, id: &CategoryId, update: CategoryUpdate) -> Result<Category> {
        let name = update.name.as_deref().map(|n| required("category name", n)).transpose()?;
        let category = self.category_mut(id)?;
        if let Some(name) = name {
            category.name = name;
        }
        if let Some(visible) = update.visible {
            category.visible = visible;
        }
        Ok(category.clone())
    }

    pub fn delete_category(&mut self, id: &CategoryId) -> Result<()> {
        let before = self.categories.len();
        self.categories.retain(|c| &c.id != id);
        if self.categories.len() == before {
            return Err(Error::not_found("category", id));
        }
        Ok(())
    }

    pub fn add_subcategory(&mut self, category_id: &CategoryId, name: &str) -> Result<Subcategory> {
        let subcategory = Subcategory {
            id: SubcategoryId::new(),
            name: required("subcategory name", name)?,
            products: Vec::new(),
        };
        self.category_mut(category_id)?.subcategories.push(subcategory.clone());
        Ok(subcategory)
    }

    pub fn rename_subcategory(
        &mut self,
        category_id: &CategoryId,
        subcategory_id: &SubcategoryId,
        name: &str,
    ) -> Result<Subcategory> {
        let name = required("subcategory name", name)?;
        let subcategory = self.subcategory_mut(category_id, subcategory_id)?;
        subcategory.name = name;
        Ok(subcategory.clone())
    }

    pub fn add_product(
        &mut self,
        category_id: &CategoryId,
        subcategory_id: &SubcategoryId,
        product: NewProduct,
    ) -> Result<Product> {
        let product = Product {
            id: ProductId::new(),
            title: required("product title", &product.title)?,
            price: product.price,
            description: product.description,
            cover_url: product.cover_url,
        };
        self.subcategory_mut(category_id, subcategory_id)?
            .products
            .push(product.clone());
        Ok(product)
    }

    pub fn update_product(&mut self, id: &ProductId, update: ProductUpdate) -> Result<Product> {
        let title = update.title.as_deref().map(|t| required("product title", t)).transpose()?;
        let product = self
            .products_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| Error::not_found("product", id))?;

        if let Some(title) = title {
            product.title = title;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(cover_url) = update.cover_url {
            product.cover_url = Some(cover_url).filter(|u| !u.trim().is_empty());
        }
        Ok(product.clone())
    }

    pub fn delete_product(&mut self, id: &ProductId) -> Result<()> {
        let mut removed = false;
        for subcategory in self.categories.iter_mut().flat_map(|c| c.subcategories.iter_mut()) {
            let before = subcategory.products.len();
            subcategory.products.retain(|p| &p.id != id);
            removed |= subcategory.products.len() != before;
        }
        if !removed {
            return Err(Error::not_found("product", id));
        }
        Ok(())
    }

    /// Every product across all categories, in catalog order.
    pub fn list_products(&self) -> Vec<&Product> {
        self.categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .flat_map(|s| s.products.iter())
            .collect()
    }

    pub fn find_product(&self, id: &ProductId) -> Result<&Product> {
        self.list_products()
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| Error::not_found("product", id))
    }

    fn category_mut(&mut self, id: &CategoryId) -> Result<&mut Category> {
        self.categories
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| Error::not_found("category", id))
    }

    fn subcategory_mut(
        &mut self,
        category_id: &CategoryId,
        subcategory_id: &SubcategoryId,
    ) -> Result<&mut Subcategory> {
        self.category_mut(category_id)?
            .subcategories
            .iter_mut()
            .find(|s| &s.id == subcategory_id)
            .ok_or_else(|| Error::not_found("subcategory", subcategory_id))
    }

    fn products_mut(&mut self) -> impl Iterator<Item = &mut Product> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.subcategories.iter_mut())
            .flat_map(|s| s.products.iter_mut())
    }
}
