use catalog_search::Component;
use std::collections::BTreeSet;

fn set(values: &[&str]) -> Option<BTreeSet<String>> {
    Some(values.iter().map(|v| v.to_string()).collect())
}

/// Builder for component records
pub struct ComponentBuilder {
    component: Component,
}

impl ComponentBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut component = Component::new(id.clone());
        component.id = Some(id);
        Self { component }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.component.name = Some(name.into());
        self
    }

    pub fn component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component.component_type = Some(component_type.into());
        self
    }

    pub fn categories(mut self, values: &[&str]) -> Self {
        self.component.categories = set(values);
        self
    }

    pub fn languages(mut self, values: &[&str]) -> Self {
        self.component.languages = set(values);
        self
    }

    pub fn operating_systems(mut self, values: &[&str]) -> Self {
        self.component.operating_systems = set(values);
        self
    }

    pub fn vendors(mut self, values: &[&str]) -> Self {
        self.component.vendor_names = set(values);
        self
    }

    pub fn licenses(mut self, values: &[&str]) -> Self {
        self.component.main_license_ids = set(values);
        self
    }

    pub fn created_on(mut self, date: impl Into<String>) -> Self {
        self.component.created_on = Some(date.into());
        self
    }

    pub fn created_by(mut self, email: impl Into<String>) -> Self {
        self.component.created_by = Some(email.into());
        self
    }

    pub fn business_unit(mut self, unit: impl Into<String>) -> Self {
        self.component.business_unit = Some(unit.into());
        self
    }

    pub fn build(self) -> Component {
        self.component
    }
}
