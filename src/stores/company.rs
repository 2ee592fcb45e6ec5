//! Company (business) membership and settings

use crate::backend::{BackendClientTrait, StoreError};
use crate::state::models::{CompanyDetail, CompanyUpdate, NewCompany, UserUpdate};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct CompanyStore {
    pub company: Option<CompanyDetail>,
}

impl CompanyStore {
    pub fn company_id(&self) -> Option<&str> {
        self.company.as_ref().map(|c| c.company.id.as_str())
    }

    /// Load the signed-in user's company. `None` means onboarding is not done.
    pub async fn get_company(
        &mut self,
        backend: &dyn BackendClientTrait,
    ) -> Result<Option<&CompanyDetail>> {
        let user = backend.get_user().await?.ok_or(StoreError::UserNotFound)?;

        let Some(company_id) = backend.get_user_company_id(&user.id).await? else {
            tracing::debug!(user_id = %user.id, "user has no company");
            self.company = None;
            return Ok(None);
        };

        self.company = Some(backend.get_company(&company_id).await?);
        Ok(self.company.as_ref())
    }

    /// Create a company and attach the signed-in user to it
    pub async fn create_company(
        &mut self,
        backend: &dyn BackendClientTrait,
        company: NewCompany,
    ) -> Result<()> {
        let created = backend.create_company(company).await?;

        let user = backend.get_user().await?.ok_or(StoreError::UserNotFound)?;
        backend
            .update_user(
                &user.id,
                UserUpdate {
                    company_id: Some(Some(created.id.clone())),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(company_id = %created.id, "company created");
        self.company = Some(CompanyDetail {
            company: created,
            users: Vec::new(),
            people: Vec::new(),
        });
        Ok(())
    }

    pub async fn update_company(
        &mut self,
        backend: &dyn BackendClientTrait,
        update: CompanyUpdate,
    ) -> Result<()> {
        let company = self.company.as_mut().ok_or(StoreError::CompanyNotFound)?;
        backend
            .update_company(&company.company.id, update.clone())
            .await?;

        if let Some(name) = update.name {
            company.company.name = name;
        }
        if let Some(email) = update.email {
            company.company.email = email;
        }
        if let Some(phone) = update.phone {
            company.company.phone = phone;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackendClientTrait;
    use crate::stores::fixtures::{auth_user, company, company_detail};

    #[tokio::test]
    async fn test_get_company_follows_user_membership() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_user()
            .returning(|| Ok(Some(auth_user("u1"))));
        backend
            .expect_get_user_company_id()
            .withf(|id| id == "u1")
            .returning(|_| Ok(Some("c1".to_string())));
        backend
            .expect_get_company()
            .withf(|id| id == "c1")
            .times(1)
            .returning(|_| Ok(company_detail("c1")));

        let mut store = CompanyStore::default();
        let loaded = store.get_company(&backend).await.unwrap();
        assert_eq!(loaded.map(|c| c.company.id.as_str()), Some("c1"));
        assert_eq!(store.company_id(), Some("c1"));
    }

    #[tokio::test]
    async fn test_get_company_without_membership_clears_state() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_get_user()
            .returning(|| Ok(Some(auth_user("u1"))));
        backend
            .expect_get_user_company_id()
            .returning(|_| Ok(None));
        backend.expect_get_company().never();

        let mut store = CompanyStore {
            company: Some(company_detail("old")),
        };
        assert!(store.get_company(&backend).await.unwrap().is_none());
        assert!(store.company.is_none());
    }

    #[tokio::test]
    async fn test_get_company_requires_user() {
        let mut backend = MockBackendClientTrait::new();
        backend.expect_get_user().returning(|| Ok(None));

        let mut store = CompanyStore::default();
        let err = store.get_company(&backend).await.unwrap_err();
        assert_eq!(err.downcast_ref::<StoreError>(), Some(&StoreError::UserNotFound));
    }

    #[tokio::test]
    async fn test_create_company_attaches_user() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_create_company()
            .withf(|c| c.name == "Acme")
            .returning(|_| Ok(company("c9")));
        backend
            .expect_get_user()
            .returning(|| Ok(Some(auth_user("u1"))));
        backend
            .expect_update_user()
            .withf(|id, update| {
                id == "u1" && update.company_id == Some(Some("c9".to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut store = CompanyStore::default();
        store
            .create_company(
                &backend,
                NewCompany {
                    name: "Acme".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.company_id(), Some("c9"));
    }

    #[tokio::test]
    async fn test_update_company_requires_loaded_company() {
        let backend = MockBackendClientTrait::new();
        let mut store = CompanyStore::default();
        let err = store
            .update_company(&backend, CompanyUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::CompanyNotFound)
        );
    }

    #[tokio::test]
    async fn test_update_company_applies_changes_locally() {
        let mut backend = MockBackendClientTrait::new();
        backend
            .expect_update_company()
            .withf(|id, _| id == "c1")
            .returning(|_, _| Ok(()));

        let mut store = CompanyStore {
            company: Some(company_detail("c1")),
        };
        store
            .update_company(
                &backend,
                CompanyUpdate {
                    phone: Some("555".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(store.company.unwrap().company.phone, "555");
    }
}
