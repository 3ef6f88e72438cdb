use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::models::{CreateEjercicio, CreateRutina, Ejercicio, Rutina, RutinaDetail, UpdateRutina};

const SELECT_RUTINA: &str = "SELECT id, nombre, descripcion, fecha_creacion FROM rutinas";
const SELECT_EJERCICIO: &str =
    "SELECT id, rutina_id, nombre, dia_semana, series, repeticiones, peso, notas, orden \
     FROM ejercicios";

/// All persistence for rutinas and their ejercicios. Create and update
/// span both tables and run inside a single transaction so a failure
/// leaves the prior exercise set intact.
#[derive(Clone)]
pub struct RutinaService {
    db: PgPool,
}

impl RutinaService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All routines, newest first, with exercises eagerly loaded.
    pub async fn list(&self) -> Result<Vec<RutinaDetail>, ApiError> {
        let rutinas = sqlx::query_as::<_, Rutina>(&format!(
            "{SELECT_RUTINA} ORDER BY fecha_creacion DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        self.attach_ejercicios(rutinas).await
    }

    pub async fn get(&self, rutina_id: i32) -> Result<Option<RutinaDetail>, ApiError> {
        let rutina = sqlx::query_as::<_, Rutina>(&format!("{SELECT_RUTINA} WHERE id = $1"))
            .bind(rutina_id)
            .fetch_optional(&self.db)
            .await?;

        let Some(rutina) = rutina else {
            return Ok(None);
        };

        let ejercicios = sqlx::query_as::<_, Ejercicio>(&format!(
            "{SELECT_EJERCICIO} WHERE rutina_id = $1 ORDER BY orden, id"
        ))
        .bind(rutina_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(RutinaDetail::new(rutina, ejercicios)))
    }

    /// Case-insensitive substring search on routine name, newest first.
    pub async fn search_by_nombre(&self, nombre: &str) -> Result<Vec<RutinaDetail>, ApiError> {
        let pattern = format!("%{}%", nombre);
        let rutinas = sqlx::query_as::<_, Rutina>(&format!(
            "{SELECT_RUTINA} WHERE nombre ILIKE $1 ORDER BY fecha_creacion DESC"
        ))
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        self.attach_ejercicios(rutinas).await
    }

    /// Create a routine together with its initial exercises.
    pub async fn create(&self, payload: CreateRutina) -> Result<RutinaDetail, ApiError> {
        let nombre = payload.nombre.trim().to_string();

        let mut tx = self.db.begin().await?;

        if self.nombre_taken(&mut tx, &nombre, None).await? {
            return Err(nombre_conflict(&nombre));
        }

        let rutina = sqlx::query_as::<_, Rutina>(
            "INSERT INTO rutinas (nombre, descripcion) VALUES ($1, $2) \
             RETURNING id, nombre, descripcion, fecha_creacion",
        )
        .bind(&nombre)
        .bind(&payload.descripcion)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &nombre))?;

        let ejercicios = insert_ejercicios(&mut tx, rutina.id, &payload.ejercicios).await?;

        tx.commit().await?;

        Ok(RutinaDetail::new(rutina, ejercicios))
    }

    /// Update name/description and, when an exercise array is provided,
    /// replace the whole exercise set in the same transaction.
    pub async fn update(
        &self,
        rutina_id: i32,
        payload: UpdateRutina,
    ) -> Result<RutinaDetail, ApiError> {
        let mut tx = self.db.begin().await?;

        let rutina = sqlx::query_as::<_, Rutina>(&format!("{SELECT_RUTINA} WHERE id = $1"))
            .bind(rutina_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| rutina_not_found(rutina_id))?;

        let nombre = match &payload.nombre {
            Some(nuevo) => {
                let nuevo = nuevo.trim().to_string();
                if nuevo != rutina.nombre
                    && self.nombre_taken(&mut tx, &nuevo, Some(rutina_id)).await?
                {
                    return Err(nombre_conflict(&nuevo));
                }
                nuevo
            }
            None => rutina.nombre.clone(),
        };
        let descripcion = payload.descripcion.clone().or_else(|| rutina.descripcion.clone());

        let rutina = sqlx::query_as::<_, Rutina>(
            "UPDATE rutinas SET nombre = $2, descripcion = $3 WHERE id = $1 \
             RETURNING id, nombre, descripcion, fecha_creacion",
        )
        .bind(rutina_id)
        .bind(&nombre)
        .bind(&descripcion)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &nombre))?;

        let ejercicios = match &payload.ejercicios {
            Some(nuevos) => {
                sqlx::query("DELETE FROM ejercicios WHERE rutina_id = $1")
                    .bind(rutina_id)
                    .execute(&mut *tx)
                    .await?;
                insert_ejercicios(&mut tx, rutina_id, nuevos).await?
            }
            None => {
                sqlx::query_as::<_, Ejercicio>(&format!(
                    "{SELECT_EJERCICIO} WHERE rutina_id = $1 ORDER BY orden, id"
                ))
                .bind(rutina_id)
                .fetch_all(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        Ok(RutinaDetail::new(rutina, ejercicios))
    }

    /// Delete a routine; its exercises go with it via the FK cascade.
    pub async fn delete(&self, rutina_id: i32) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM rutinas WHERE id = $1")
            .bind(rutina_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(rutina_not_found(rutina_id));
        }

        Ok(())
    }

    async fn nombre_taken(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        nombre: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, ApiError> {
        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM rutinas WHERE nombre = $1")
                .bind(nombre)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(match (existing, exclude_id) {
            (Some((id,)), Some(exclude)) => id != exclude,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    /// Batch-load exercises for a page of routines and group them back
    /// onto their owners, preserving the routines' order.
    async fn attach_ejercicios(
        &self,
        rutinas: Vec<Rutina>,
    ) -> Result<Vec<RutinaDetail>, ApiError> {
        if rutinas.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rutinas.iter().map(|r| r.id).collect();
        let ejercicios = sqlx::query_as::<_, Ejercicio>(&format!(
            "{SELECT_EJERCICIO} WHERE rutina_id = ANY($1) ORDER BY orden, id"
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_rutina: HashMap<i32, Vec<Ejercicio>> = HashMap::new();
        for ejercicio in ejercicios {
            by_rutina.entry(ejercicio.rutina_id).or_default().push(ejercicio);
        }

        Ok(rutinas
            .into_iter()
            .map(|rutina| {
                let ejercicios = by_rutina.remove(&rutina.id).unwrap_or_default();
                RutinaDetail::new(rutina, ejercicios)
            })
            .collect())
    }
}

/// Insert the submitted exercises for a routine. Exercises without an
/// explicit `orden` take their position index in the submitted array.
async fn insert_ejercicios(
    tx: &mut Transaction<'_, Postgres>,
    rutina_id: i32,
    ejercicios: &[CreateEjercicio],
) -> Result<Vec<Ejercicio>, ApiError> {
    let mut inserted = Vec::with_capacity(ejercicios.len());

    for (idx, ejercicio) in ejercicios.iter().enumerate() {
        let orden = ejercicio.orden.unwrap_or(idx as i32);
        let row = sqlx::query_as::<_, Ejercicio>(
            "INSERT INTO ejercicios (rutina_id, nombre, dia_semana, series, repeticiones, peso, notas, orden) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, rutina_id, nombre, dia_semana, series, repeticiones, peso, notas, orden",
        )
        .bind(rutina_id)
        .bind(ejercicio.nombre.trim())
        .bind(ejercicio.dia_semana)
        .bind(ejercicio.series)
        .bind(ejercicio.repeticiones)
        .bind(ejercicio.peso)
        .bind(&ejercicio.notas)
        .bind(orden)
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row);
    }

    Ok(inserted)
}

fn rutina_not_found(rutina_id: i32) -> ApiError {
    ApiError::NotFound(format!("no routine found with id {}", rutina_id))
}

fn nombre_conflict(nombre: &str) -> ApiError {
    ApiError::Conflict(format!("a routine named '{}' already exists", nombre))
}

/// The in-transaction name pre-check is best effort; the UNIQUE
/// constraint is the final arbiter for concurrent writers.
fn map_unique_violation(e: sqlx::Error, nombre: &str) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23505") {
            return nombre_conflict(nombre);
        }
    }
    ApiError::from(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_conflict_helpers_carry_context() {
        assert!(matches!(rutina_not_found(42), ApiError::NotFound(msg) if msg.contains("42")));
        assert!(
            matches!(nombre_conflict("Push Day"), ApiError::Conflict(msg) if msg.contains("Push Day"))
        );
    }

    #[test]
    fn non_unique_violations_stay_database_errors() {
        let mapped = map_unique_violation(sqlx::Error::PoolTimedOut, "Push Day");
        assert!(matches!(mapped, ApiError::Database(_)));
    }
}
