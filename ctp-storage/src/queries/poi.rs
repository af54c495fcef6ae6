use rusqlite::{params, Connection, OptionalExtension};

use ctp_core::errors::StorageError;
use ctp_core::types::identifiers::{FileId, PoiId, RunId};
use ctp_core::types::{Poi, PoiType};

pub fn upsert_poi(conn: &Connection, poi: &Poi) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO pois (id, file_id, run_id, semantic_id, name, poi_type, start_line, end_line, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(run_id, semantic_id) DO UPDATE SET
             name = excluded.name,
             poi_type = excluded.poi_type,
             start_line = excluded.start_line,
             end_line = excluded.end_line,
             description = excluded.description",
        params![
            poi.id.as_str(),
            poi.file_id.as_str(),
            poi.run_id.as_str(),
            poi.semantic_id,
            poi.name,
            poi.poi_type.as_str(),
            poi.start_line,
            poi.end_line,
            poi.description,
        ],
    )?;
    Ok(())
}

pub fn get_poi(conn: &Connection, run_id: &str, poi_id: &str) -> Result<Option<Poi>, StorageError> {
    conn.query_row(
        "SELECT id, file_id, run_id, semantic_id, name, poi_type, start_line, end_line, description
         FROM pois WHERE run_id = ?1 AND id = ?2",
        params![run_id, poi_id],
        row_to_poi,
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn find_by_semantic_id(
    conn: &Connection,
    run_id: &str,
    semantic_id: &str,
) -> Result<Option<Poi>, StorageError> {
    conn.query_row(
        "SELECT id, file_id, run_id, semantic_id, name, poi_type, start_line, end_line, description
         FROM pois WHERE run_id = ?1 AND semantic_id = ?2",
        params![run_id, semantic_id],
        row_to_poi,
    )
    .optional()
    .map_err(StorageError::from)
}

pub fn pois_for_run(conn: &Connection, run_id: &str) -> Result<Vec<Poi>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, file_id, run_id, semantic_id, name, poi_type, start_line, end_line, description
         FROM pois WHERE run_id = ?1",
    )?;
    let rows = stmt.query_map(params![run_id], row_to_poi)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn poi_count(conn: &Connection, run_id: &str) -> Result<u64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM pois WHERE run_id = ?1", params![run_id], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as u64)
    .map_err(StorageError::from)
}

fn row_to_poi(row: &rusqlite::Row<'_>) -> rusqlite::Result<Poi> {
    let poi_type_str: String = row.get(5)?;
    Ok(Poi {
        id: PoiId::new(row.get::<_, String>(0)?),
        file_id: FileId::new(row.get::<_, String>(1)?),
        run_id: RunId::new(row.get::<_, String>(2)?),
        semantic_id: row.get(3)?,
        name: row.get(4)?,
        poi_type: parse_poi_type(&poi_type_str),
        start_line: row.get(6)?,
        end_line: row.get(7)?,
        description: row.get(8)?,
    })
}

fn parse_poi_type(s: &str) -> PoiType {
    match s {
        "file" => PoiType::File,
        "class" => PoiType::Class,
        "function" => PoiType::Function,
        "variable" => PoiType::Variable,
        "import" => PoiType::Import,
        "export" => PoiType::Export,
        "table" => PoiType::Table,
        "view" => PoiType::View,
        "index" => PoiType::Index,
        "trigger" => PoiType::Trigger,
        _ => PoiType::Variable,
    }
}
