//! Excel-specific automation on top of the IDispatch wrapper.

#![cfg(windows)]

use std::collections::HashMap;

use windows::Win32::System::Variant::VARIANT;

use excel_com_protocol::{CellError, CellValue, SheetRef};

use crate::dispatch::{
    variant_bool, variant_empty, variant_f64, variant_get_bool, variant_get_f64,
    variant_get_string, variant_i32, variant_is_empty, variant_is_error, variant_str,
    DispatchObject,
};

/// One Excel.Application instance and the workbooks opened through it.
pub struct ExcelApp {
    app: DispatchObject,
    workbooks_collection: DispatchObject,
    workbooks: HashMap<u64, DispatchObject>,
    next_handle: u64,
}

impl ExcelApp {
    /// Create a hidden, non-interactive Excel.Application.
    pub fn new() -> Result<Self, String> {
        let app = DispatchObject::create_from_progid("Excel.Application")?;

        app.put("Visible", variant_bool(false))?;
        app.put("DisplayAlerts", variant_bool(false))?;
        app.put("ScreenUpdating", variant_bool(false))?;
        app.put("AskToUpdateLinks", variant_bool(false))?;

        let workbooks_collection = app.child("Workbooks")?;

        Ok(Self {
            app,
            workbooks_collection,
            workbooks: HashMap::new(),
            next_handle: 1,
        })
    }

    /// Open a workbook from a Windows path. Returns the handle ID.
    pub fn open_workbook(&mut self, path: &str) -> Result<u64, String> {
        let wb = self
            .workbooks_collection
            .call_child("Open", &[variant_str(path)])?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.workbooks.insert(handle, wb);
        Ok(handle)
    }

    fn workbook(&self, handle: u64) -> Result<&DispatchObject, String> {
        self.workbooks
            .get(&handle)
            .ok_or_else(|| format!("Unknown workbook handle: {handle}"))
    }

    /// Worksheet names in tab order.
    pub fn list_worksheets(&self, wb_handle: u64) -> Result<Vec<String>, String> {
        let sheets = self.workbook(wb_handle)?.child("Worksheets")?;
        let count = variant_get_f64(&sheets.get("Count")?)
            .ok_or_else(|| "Worksheets.Count is not a number".to_string())? as i32;

        // Excel collections are 1-based
        (1..=count)
            .map(|i| {
                let sheet = sheets.item("Item", variant_i32(i))?;
                variant_get_string(&sheet.get("Name")?)
                    .ok_or_else(|| format!("Worksheet {i} has no name"))
            })
            .collect()
    }

    fn sheet(&self, wb_handle: u64, sheet: &SheetRef) -> Result<DispatchObject, String> {
        let sheets = self.workbook(wb_handle)?.child("Worksheets")?;
        match sheet {
            SheetRef::Index(idx) => sheets.item("Item", variant_i32(*idx as i32 + 1)),
            SheetRef::Name(name) => sheets.item("Item", variant_str(name)),
        }
    }

    fn range(&self, wb_handle: u64, sheet: &SheetRef, cell: &str) -> Result<DispatchObject, String> {
        self.sheet(wb_handle, sheet)?.item("Range", variant_str(cell))
    }

    pub fn set_cell_value(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        cell: &str,
        value: &CellValue,
    ) -> Result<(), String> {
        self.range(wb_handle, sheet, cell)?
            .put("Value", cell_value_to_variant(value))
    }

    pub fn get_cell_value(
        &self,
        wb_handle: u64,
        sheet: &SheetRef,
        cell: &str,
    ) -> Result<CellValue, String> {
        let variant = self.range(wb_handle, sheet, cell)?.get("Value")?;
        Ok(variant_to_cell_value(&variant))
    }

    pub fn recalculate(&self) -> Result<(), String> {
        self.app.call("Calculate", &[])?;
        Ok(())
    }

    /// Save in place, keeping the workbook's format.
    pub fn save_workbook(&self, wb_handle: u64) -> Result<(), String> {
        self.workbook(wb_handle)?.call("Save", &[])?;
        Ok(())
    }

    /// Close a workbook without saving. The handle is forgotten even if
    /// Excel reports an error.
    pub fn close_workbook(&mut self, wb_handle: u64) -> Result<(), String> {
        let wb = self
            .workbooks
            .remove(&wb_handle)
            .ok_or_else(|| format!("Unknown workbook handle: {wb_handle}"))?;
        wb.call("Close", &[variant_bool(false)])?;
        Ok(())
    }

    /// Close every workbook still open and quit Excel.
    pub fn shutdown(mut self) -> Result<(), String> {
        let handles: Vec<u64> = self.workbooks.keys().copied().collect();
        for h in handles {
            let _ = self.close_workbook(h);
        }
        self.app.call("Quit", &[])?;
        Ok(())
    }
}

fn cell_value_to_variant(value: &CellValue) -> VARIANT {
    match value {
        CellValue::Null => variant_empty(),
        CellValue::Bool(b) => variant_bool(*b),
        CellValue::Number(n) => variant_f64(*n),
        CellValue::String(s) => variant_str(s),
        CellValue::Error(_) => variant_empty(), // Can't set error values
    }
}

fn variant_to_cell_value(variant: &VARIANT) -> CellValue {
    if variant_is_empty(variant) {
        CellValue::Null
    } else if let Some(b) = variant_get_bool(variant) {
        CellValue::Bool(b)
    } else if let Some(n) = variant_get_f64(variant) {
        CellValue::Number(n)
    } else if let Some(s) = variant_get_string(variant) {
        CellValue::String(s)
    } else if variant_is_error(variant) {
        CellValue::Error(CellError {
            code: "#ERR(VT_ERROR)".to_string(),
        })
    } else {
        CellValue::Null
    }
}
