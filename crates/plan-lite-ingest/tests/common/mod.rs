// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inline fixtures shared by the integration tests

#![allow(dead_code)]

/// Minimal ASCII DXF writer
#[derive(Default)]
pub struct DxfFixture {
    insunits: Option<i32>,
    layers: Vec<String>,
    entities: Vec<String>,
}

impl DxfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insunits(mut self, code: i32) -> Self {
        self.insunits = Some(code);
        self
    }

    pub fn layer(mut self, name: &str) -> Self {
        self.layers.push(name.to_string());
        self
    }

    /// Closed axis-aligned rectangle as an LWPOLYLINE
    pub fn rect(self, layer: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        self.lwpolyline(layer, &[(x0, y0), (x1, y0), (x1, y1), (x0, y1)], true)
    }

    pub fn lwpolyline(mut self, layer: &str, points: &[(f64, f64)], closed: bool) -> Self {
        let mut body = format!(
            "0\nLWPOLYLINE\n5\n{:X}\n8\n{}\n90\n{}\n70\n{}\n",
            0x100 + self.entities.len(),
            layer,
            points.len(),
            if closed { 1 } else { 0 }
        );
        for (x, y) in points {
            body.push_str(&format!("10\n{}\n20\n{}\n", x, y));
        }
        self.entities.push(body);
        self
    }

    /// Closed classic POLYLINE with VERTEX / SEQEND
    pub fn polyline(mut self, layer: &str, points: &[(f64, f64)]) -> Self {
        let mut body = format!("0\nPOLYLINE\n8\n{}\n66\n1\n70\n1\n", layer);
        for (x, y) in points {
            body.push_str(&format!("0\nVERTEX\n8\n{}\n10\n{}\n20\n{}\n", layer, x, y));
        }
        body.push_str(&format!("0\nSEQEND\n8\n{}\n", layer));
        self.entities.push(body);
        self
    }

    /// Closed rectangle in paper space
    pub fn paper_rect(mut self, layer: &str, w: f64, h: f64) -> Self {
        self.entities.push(format!(
            "0\nLWPOLYLINE\n67\n1\n8\n{}\n90\n4\n70\n1\n10\n0\n20\n0\n10\n{w}\n20\n0\n10\n{w}\n20\n{h}\n10\n0\n20\n{h}\n",
            layer
        ));
        self
    }

    pub fn text(mut self, layer: &str, value: &str) -> Self {
        self.entities.push(format!(
            "0\nTEXT\n8\n{}\n10\n0\n20\n0\n40\n2.5\n1\n{}\n",
            layer, value
        ));
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::from("0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1027\n");
        if let Some(code) = self.insunits {
            out.push_str(&format!("9\n$INSUNITS\n70\n{}\n", code));
        }
        out.push_str("0\nENDSEC\n");

        out.push_str(&format!(
            "0\nSECTION\n2\nTABLES\n0\nTABLE\n2\nLAYER\n70\n{}\n",
            self.layers.len()
        ));
        for (i, name) in self.layers.iter().enumerate() {
            out.push_str(&format!(
                "0\nLAYER\n2\n{}\n70\n0\n62\n{}\n6\nCONTINUOUS\n",
                name,
                i + 1
            ));
        }
        out.push_str("0\nENDTAB\n0\nENDSEC\n");

        out.push_str("0\nSECTION\n2\nENTITIES\n");
        for entity in &self.entities {
            out.push_str(entity);
        }
        out.push_str("0\nENDSEC\n0\nEOF\n");
        out
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.build().into_bytes()
    }
}

/// The site / three-level drawing: a 4000 x 3000 site and three
/// 3000 x 2100 level outlines, in millimetres without `$INSUNITS`
pub fn site_and_levels() -> DxfFixture {
    DxfFixture::new()
        .layer("0")
        .layer("SITE")
        .layer("LEVEL 1")
        .layer("LEVEL 2")
        .layer("LEVEL 3")
        .layer("A-ANNO")
        .rect("SITE", 0.0, 0.0, 4000.0, 3000.0)
        .rect("LEVEL 1", 500.0, 500.0, 3500.0, 2600.0)
        .rect("LEVEL 2", 500.0, 500.0, 3500.0, 2600.0)
        .rect("LEVEL 3", 500.0, 500.0, 3500.0, 2600.0)
        .lwpolyline("A-ANNO", &[(0.0, 0.0), (100.0, 100.0)], false)
        .text("A-ANNO", "Ground")
}

/// Two storeys; one space contained, one nested under another space,
/// one with no containment edge and one repeating a GlobalId
pub const TWO_STOREYS: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('offices.ifc','2024-05-02T09:00:00',('Author'),('Org'),'pre','PlanTool 4.2','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0proj',$,'Offices',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);
#10=IFCBUILDINGSTOREY('0st1',$,'Ground Floor',$,$,$,$,$,.ELEMENT.,0.);
#11=IFCBUILDINGSTOREY('0st2',$,'First Floor',$,$,$,$,$,.ELEMENT.,3.5);
#20=IFCSPACE('0sp1',$,'101',$,$,$,$,'Office',.ELEMENT.,$,$);
#21=IFCSPACE('0sp2',$,'102',$,$,$,$,'Meeting',.ELEMENT.,$,$);
#22=IFCSPACE('0sp3',$,'201',$,$,$,#60,'Open Plan',.ELEMENT.,$,$);
#23=IFCSPACE('0sp4',$,'Store',$,$,$,$,$,.ELEMENT.,$,$);
#24=IFCSPACE('0sp1',$,'101 copy',$,$,$,$,$,.ELEMENT.,$,$);
#30=IFCRELAGGREGATES('0agg1',$,$,$,#10,(#20));
#31=IFCRELAGGREGATES('0agg2',$,$,$,#20,(#21));
#32=IFCRELCONTAINEDINSPATIALSTRUCTURE('0con1',$,$,$,(#22),#11);
#40=IFCQUANTITYAREA('NetFloorArea',$,$,18.5,$);
#41=IFCELEMENTQUANTITY('0q1',$,'Qto_SpaceBaseQuantities',$,$,(#40));
#42=IFCRELDEFINESBYPROPERTIES('0def1',$,$,$,(#20),#41);
#60=IFCPRODUCTDEFINITIONSHAPE($,$,(#61));
#61=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#62));
#62=IFCEXTRUDEDAREASOLID(#63,$,$,3.);
#63=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,6.,4.);
#70=IFCPRESENTATIONLAYERASSIGNMENT('A-SPACE',$,(#62,#63),$);
ENDSEC;
END-ISO-10303-21;
"#;

/// A model with spaces but no storeys at all
pub const NO_STOREYS: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('0proj',$,'Sheds',$,$,$,$,$,$);
#20=IFCSPACE('0sp1',$,'Shed A',$,$,$,$,$,.ELEMENT.,$,$);
#21=IFCSPACE($,$,'Shed B',$,$,$,$,$,.ELEMENT.,$,$);
ENDSEC;
END-ISO-10303-21;
"#;
