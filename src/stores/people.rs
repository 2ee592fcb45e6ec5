//! People registered by the company

use super::company::CompanyStore;
use crate::backend::{BackendClientTrait, StoreError};
use crate::state::models::{NewPerson, Person};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct PeopleStore {
    pub people: Vec<Person>,
    pub person: Option<Person>,
}

impl PeopleStore {
    /// Reload the company, then list its people
    pub async fn get_people(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: &mut CompanyStore,
    ) -> Result<&[Person]> {
        let company_id = company
            .get_company(backend)
            .await?
            .map(|c| c.company.id.clone())
            .ok_or(StoreError::CompanyNotFound)?;

        self.people = backend.list_people(&company_id).await?;
        Ok(&self.people)
    }

    pub async fn create_person(
        &mut self,
        backend: &dyn BackendClientTrait,
        person: NewPerson,
    ) -> Result<Person> {
        let created = backend.create_person(person).await?;
        self.person = Some(created.clone());
        Ok(created)
    }
}
