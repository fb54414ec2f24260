//! Package quantity-type mappings
//!
//! Shared reference data written by whoever seeds a package first. Concurrent
//! writers race on the same key, so inserts ignore conflicts and read the
//! stored mapping back to tell an identical duplicate from a real conflict.

use sqlx::PgConnection;
use tracing::{debug, warn};

use domain_catalog::{PackageType, QuantityType};
use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageQuantityTypeRepository;

impl PackageQuantityTypeRepository {
    /// Records the quantity type of a package type
    ///
    /// # Returns
    ///
    /// The stored quantity type.
    ///
    /// # Errors
    ///
    /// `DatabaseError::DuplicateEntry` when the package type is already
    /// mapped to a different quantity type.
    pub async fn ensure_mapping(
        conn: &mut PgConnection,
        package_type: PackageType,
    ) -> Result<QuantityType, DatabaseError> {
        let quantity_type = package_type.quantity_type();

        let inserted = sqlx::query(
            r#"
            INSERT INTO package_quantity_type_mapping (package_type, quantity_type)
            VALUES ($1, $2)
            ON CONFLICT (package_type) DO NOTHING
            "#,
        )
        .bind(package_type.as_str())
        .bind(quantity_type.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        let stored: String = sqlx::query_scalar(
            "SELECT quantity_type FROM package_quantity_type_mapping WHERE package_type = $1",
        )
        .bind(package_type.as_str())
        .fetch_one(&mut *conn)
        .await?;

        if stored != quantity_type.as_str() {
            warn!(
                package_type = package_type.as_str(),
                stored = %stored,
                wanted = quantity_type.as_str(),
                "Conflicting package quantity type mapping"
            );
            return Err(DatabaseError::duplicate(
                "PackageQuantityTypeMapping",
                "package_type",
                package_type.as_str(),
            ));
        }

        debug!(package_type = package_type.as_str(), inserted = inserted == 1, "Package quantity type mapped");
        stored.parse().map_err(DatabaseError::invalid_value)
    }

    pub async fn find(
        conn: &mut PgConnection,
        package_type: PackageType,
    ) -> Result<Option<QuantityType>, DatabaseError> {
        let stored: Option<String> = sqlx::query_scalar(
            "SELECT quantity_type FROM package_quantity_type_mapping WHERE package_type = $1",
        )
        .bind(package_type.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        stored
            .map(|value| value.parse().map_err(DatabaseError::invalid_value))
            .transpose()
    }
}
